//! `ports` → `publishPorts`.

use quadlify_compose::model::PortSpec;
use quadlify_quadlet::Text;

use crate::variables::Bindings;

/// Translates one port, binding it to `bind_address` when the source
/// names no host address.
///
/// `HOST:CONTAINER` becomes `ADDR:HOST:CONTAINER` and a bare `CONTAINER`
/// becomes `ADDR::CONTAINER`.
#[must_use]
pub fn publish_port(port: &PortSpec, bindings: &Bindings, bind_address: &str) -> Text {
    let mut text = match &port.host_ip {
        Some(host_ip) => bindings.substitute(host_ip),
        None => Text::literal(bracket_ipv6(bind_address)),
    };
    text.push_str(":");
    if let Some(published) = &port.published {
        text.append(&bindings.substitute(published));
    }
    text.push_str(":");
    text.append(&bindings.substitute(&port.target));
    if let Some(protocol) = &port.protocol {
        text.push_str("/");
        text.push_str(protocol);
    }
    text
}

fn bracket_ipv6(address: &str) -> String {
    if address.contains(':') && !address.starts_with('[') {
        format!("[{address}]")
    } else {
        address.to_owned()
    }
}
