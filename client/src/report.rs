use crate::client::ProbeResult;
use crate::config::Family;

/// One line per `(interface, family)` pair.
pub fn render(iface: &str, family: Family, result: Option<&ProbeResult>) -> String {
    let result = match result {
        Some(v) => v,
        None => return format!("{} / {}  skipping (no address)", iface, family),
    };

    let tag = result.classification();
    match &result.outcome {
        Ok(v) => format!(
            "{} / {}  {} (outside {}, inside {})",
            iface, family, tag, v.external, v.internal
        ),
        Err(e) => format!("{} / {}  {} {}", iface, family, tag, e),
    }
}
