use std::io;
use std::net::IpAddr;

use crate::config::Family;

/// An interface name with the addresses bound to it, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInterface {
    pub name: String,
    pub loopback: bool,
    pub addrs: Vec<IpAddr>,
}

impl LocalInterface {
    pub fn new(name: impl Into<String>, addrs: Vec<IpAddr>) -> Self {
        let loopback = !addrs.is_empty() && addrs.iter().all(|x| x.is_loopback());
        Self {
            name: name.into(),
            loopback,
            addrs,
        }
    }

    /// First address of the family, `None` means the pair is skipped.
    pub fn select_address(&self, family: Family) -> Option<IpAddr> {
        self.addrs
            .iter()
            .find(|x| family.matches(**x))
            .map(|x| x.to_canonical())
    }
}

pub fn enumerate() -> io::Result<Vec<LocalInterface>> {
    let mut list: Vec<LocalInterface> = vec![];

    for v in get_if_addrs::get_if_addrs()? {
        let ip = v.ip();
        match list.iter_mut().find(|x| x.name == v.name) {
            Some(x) => {
                x.addrs.push(ip);
                x.loopback = x.loopback && v.is_loopback();
            }
            None => list.push(LocalInterface {
                loopback: v.is_loopback(),
                name: v.name,
                addrs: vec![ip],
            }),
        }
    }

    log::debug!("interfaces: {:?}", list);
    Ok(list)
}

/// Drops interfaces with only loopback addresses. Interfaces that are down
/// are not filtered, `get_if_addrs` reports no link flags; their probes fail
/// at bind or connect and are reported as errors.
pub fn non_loopback(list: Vec<LocalInterface>) -> Vec<LocalInterface> {
    list.into_iter().filter(|x| !x.loopback).collect()
}

/// `(interface, family)` pairs in enumeration order, IPv4 first.
pub fn worklist(list: &[LocalInterface]) -> impl Iterator<Item = (&LocalInterface, Family)> + '_ {
    list.iter()
        .flat_map(|x| Family::ALL.iter().map(move |f| (x, *f)))
}
