//! MSP trust material in its canonical string form.

use serde::{Deserialize, Serialize};

/// An organization's identity configuration as known to a channel.
///
/// Certificates are PEM text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MspInfo {
    pub id: String,
    pub name: String,
    pub root_certs: Vec<String>,
    pub intermediate_certs: Vec<String>,
    pub admins: Vec<String>,
    pub revocation_list: Vec<String>,
    pub organizational_unit_identifiers: Vec<String>,
    pub tls_root_certs: Vec<String>,
    pub tls_intermediate_certs: Vec<String>,
}

impl MspInfo {
    /// All TLS trust roots joined into one PEM bundle.
    #[must_use]
    pub fn tls_ca_bundle(&self) -> String {
        self.tls_root_certs
            .iter()
            .chain(self.tls_intermediate_certs.iter())
            .map(|pem| pem.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
