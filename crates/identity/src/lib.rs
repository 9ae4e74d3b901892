//! Per-deployment certificate authority and mutual-TLS identity.
//!
//! Every `holomush` deployment owns a self-signed CA (`Ca`). The CA issues a
//! server leaf certificate for the core process and one client leaf
//! certificate per connecting peer (`Cert`). Connections are mutually
//! authenticated: the server's [`rustls::ServerConfig`] requires and verifies
//! a client certificate signed by the same CA, and the client pins that CA as
//! its sole trust root. There is no public PKI involved and no revocation
//! list — a compromised leaf is handled by regenerating the CA.
//!
//! Leaves are generated with [`rcgen`]; `rcgen::Certificate` does not expose
//! parsed certificate fields once serialized, so validation (hostname
//! matching, extended key usage, expiry) re-parses the stored DER with
//! [`x509_parser`] on demand rather than caching decoded metadata.

pub mod error;

use std::{
    net::{IpAddr, Ipv4Addr},
    path::Path,
    sync::Arc,
};

use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose, SanType,
};
use rustls::pki_types::CertificateDer;
use time::{Duration, OffsetDateTime};

pub use error::{Error, Result};

/// CA certificates are long-lived; rotating the CA invalidates every leaf.
pub const CA_VALIDITY_YEARS: i64 = 10;
/// Leaf certificates are rotated far more often than the CA.
pub const LEAF_VALIDITY_YEARS: i64 = 1;

/// Required key usage a leaf certificate must carry for its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtKeyUsage {
    ServerAuth,
    ClientAuth,
}

/// Outcome of comparing a certificate's validity window against now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationStatus {
    pub expired: bool,
    pub not_yet_valid: bool,
    pub near_expiration: bool,
    pub days_remaining: i64,
    pub warning: Option<String>,
    pub error: Option<String>,
}

impl ExpirationStatus {
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.expired && !self.not_yet_valid
    }
}

/// Owned DER plus PEM forms of a certificate and its private key.
///
/// DER is kept alongside PEM so validation can re-parse without a round trip
/// through `rustls_pemfile`; PEM is kept because that's the form persisted to
/// disk and loaded into `rustls` configs.
struct CertKeyPair {
    cert_pem: String,
    key_pem: String,
    der: Vec<u8>,
}

impl CertKeyPair {
    fn from_pem(cert_pem: String, key_pem: String) -> Result<Self> {
        let der = rustls_pemfile::certs(&mut cert_pem.as_bytes())
            .next()
            .ok_or_else(|| Error::format("no certificate found in PEM"))?
            .map_err(Error::from)?
            .to_vec();
        Ok(Self {
            cert_pem,
            key_pem,
            der,
        })
    }

    fn parsed(&self) -> Result<x509_parser::certificate::X509Certificate<'_>> {
        let (_, cert) = x509_parser::certificate::X509Certificate::from_der(&self.der)
            .map_err(|e| Error::format(e.to_string()))?;
        Ok(cert)
    }

    fn common_name(&self) -> Result<String> {
        let cert = self.parsed()?;
        Ok(cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or_default()
            .to_string())
    }

    fn general_names<F, T>(&self, extract: F) -> Result<Vec<T>>
    where
        F: Fn(&x509_parser::extensions::GeneralName<'_>) -> Option<T>,
    {
        let cert = self.parsed()?;
        let names = cert
            .subject_alternative_name()
            .map_err(|e| Error::format(e.to_string()))?
            .map(|ext| {
                ext.value
                    .general_names
                    .iter()
                    .filter_map(&extract)
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    fn dns_sans(&self) -> Result<Vec<String>> {
        self.general_names(|gn| match gn {
            x509_parser::extensions::GeneralName::DNSName(name) => Some((*name).to_string()),
            _ => None,
        })
    }

    fn uri_sans(&self) -> Result<Vec<String>> {
        self.general_names(|gn| match gn {
            x509_parser::extensions::GeneralName::URI(uri) => Some((*uri).to_string()),
            _ => None,
        })
    }

    fn ip_sans(&self) -> Result<Vec<IpAddr>> {
        self.general_names(|gn| match gn {
            x509_parser::extensions::GeneralName::IPAddress(bytes) => parse_ip(bytes),
            _ => None,
        })
    }

    fn not_before(&self) -> Result<OffsetDateTime> {
        let cert = self.parsed()?;
        asn1_time_to_offset(cert.validity().not_before)
    }

    fn not_after(&self) -> Result<OffsetDateTime> {
        let cert = self.parsed()?;
        asn1_time_to_offset(cert.validity().not_after)
    }

    fn serial_hex(&self) -> Result<String> {
        let cert = self.parsed()?;
        Ok(cert.raw_serial_as_string())
    }

    fn extended_key_usage(&self, required: ExtKeyUsage) -> Result<bool> {
        let cert = self.parsed()?;
        let eku = cert
            .extended_key_usage()
            .map_err(|e| Error::format(e.to_string()))?;
        Ok(eku
            .map(|ext| match required {
                ExtKeyUsage::ServerAuth => ext.value.server_auth,
                ExtKeyUsage::ClientAuth => ext.value.client_auth,
            })
            .unwrap_or(false))
    }
}

fn parse_ip(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => Some(IpAddr::V4(Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]))),
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(bytes);
            Some(IpAddr::V6(octets.into()))
        }
        _ => None,
    }
}

fn asn1_time_to_offset(t: x509_parser::time::ASN1Time) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(t.timestamp()).map_err(|e| Error::format(e.to_string()))
}

/// The self-signed root of trust for one deployment.
pub struct Ca(CertKeyPair);

impl Ca {
    #[must_use]
    pub fn cert_pem(&self) -> &str {
        &self.0.cert_pem
    }

    #[must_use]
    pub fn key_pem(&self) -> &str {
        &self.0.key_pem
    }

    /// Common name of the CA, e.g. `"Holomush CA westmarch"`.
    pub fn common_name(&self) -> Result<String> {
        self.0.common_name()
    }

    /// The `holomush://game/<id>` URI SAN stamped on the CA at generation.
    pub fn game_uri(&self) -> Result<Option<String>> {
        Ok(self.0.uri_sans()?.into_iter().next())
    }

    /// Rebuild a throwaway `rcgen` issuer suitable for `signed_by`.
    ///
    /// The reconstructed certificate carries a fresh random serial and is
    /// never persisted; what matters for chain validation later is that the
    /// embedded public key (and therefore the signature it produces) matches
    /// the CA's real key, which is loaded verbatim from `key_pem`.
    fn issuer(&self) -> Result<(rcgen::Certificate, KeyPair)> {
        let key = KeyPair::from_pem(&self.0.key_pem)?;
        let params = CertificateParams::from_ca_cert_pem(&self.0.cert_pem)?;
        let cert = params.self_signed(&key)?;
        Ok((cert, key))
    }
}

/// A leaf certificate signed by a [`Ca`] — either a server or client identity.
pub struct Cert(CertKeyPair);

impl Cert {
    #[must_use]
    pub fn cert_pem(&self) -> &str {
        &self.0.cert_pem
    }

    #[must_use]
    pub fn key_pem(&self) -> &str {
        &self.0.key_pem
    }

    pub fn common_name(&self) -> Result<String> {
        self.0.common_name()
    }

    pub fn serial_hex(&self) -> Result<String> {
        self.0.serial_hex()
    }
}

/// Generate a new CA for `game_id`.
///
/// CN is `"Holomush CA <game_id>"`; the CA carries a `holomush://game/<id>`
/// URI SAN so a leaf's issuer can be tied back to a specific deployment.
pub fn generate_ca(game_id: &str) -> Result<Ca> {
    let now = OffsetDateTime::now_utc();
    let key = KeyPair::generate()?;
    let mut params = CertificateParams::new(Vec::<String>::new())?;
    params
        .distinguished_name
        .push(DnType::CommonName, format!("Holomush CA {game_id}"));
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    params.subject_alt_names = vec![SanType::URI(
        format!("holomush://game/{game_id}").try_into()?,
    )];
    params.not_before = now;
    params.not_after = now + Duration::days(365 * CA_VALIDITY_YEARS);

    let cert = params.self_signed(&key)?;
    Ok(Ca(CertKeyPair {
        der: cert.der().to_vec(),
        cert_pem: cert.pem(),
        key_pem: key.serialize_pem(),
    }))
}

/// Issue a server leaf for `name` under `ca`.
///
/// SANs cover `localhost`, `holomush-<game_id>` (the name clients dial), and
/// `127.0.0.1`; the certificate carries the `serverAuth` EKU only.
pub fn generate_server_cert(ca: &Ca, game_id: &str, name: &str) -> Result<Cert> {
    let now = OffsetDateTime::now_utc();
    let key = KeyPair::generate()?;
    let mut params = CertificateParams::new(Vec::<String>::new())?;
    params
        .distinguished_name
        .push(DnType::CommonName, format!("holomush-{name}"));
    params.subject_alt_names = vec![
        SanType::DnsName("localhost".try_into()?),
        SanType::DnsName(format!("holomush-{game_id}").as_str().try_into()?),
        SanType::IpAddress(IpAddr::V4(Ipv4Addr::LOCALHOST)),
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    params.not_before = now;
    params.not_after = now + Duration::days(365 * LEAF_VALIDITY_YEARS);

    let (issuer_cert, issuer_key) = ca.issuer()?;
    let signed = params.signed_by(&key, &issuer_cert, &issuer_key)?;
    Ok(Cert(CertKeyPair {
        der: signed.der().to_vec(),
        cert_pem: signed.pem(),
        key_pem: key.serialize_pem(),
    }))
}

/// Issue a client leaf for `name` under `ca`.
///
/// No DNS/IP SANs — client certs authenticate a peer's identity, not a
/// hostname — and the certificate carries the `clientAuth` EKU only.
pub fn generate_client_cert(ca: &Ca, name: &str) -> Result<Cert> {
    let now = OffsetDateTime::now_utc();
    let key = KeyPair::generate()?;
    let mut params = CertificateParams::new(Vec::<String>::new())?;
    params
        .distinguished_name
        .push(DnType::CommonName, format!("holomush-{name}"));
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
    params.not_before = now;
    params.not_after = now + Duration::days(365 * LEAF_VALIDITY_YEARS);

    let (issuer_cert, issuer_key) = ca.issuer()?;
    let signed = params.signed_by(&key, &issuer_cert, &issuer_key)?;
    Ok(Cert(CertKeyPair {
        der: signed.der().to_vec(),
        cert_pem: signed.pem(),
        key_pem: key.serialize_pem(),
    }))
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

fn write_pem_pair(dir: &Path, stem: &str, cert_pem: &str, key_pem: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(format!("{stem}.crt")), cert_pem)?;
    let key_path = dir.join(format!("{stem}.key"));
    std::fs::write(&key_path, key_pem)?;
    restrict_to_owner(&key_path)?;
    Ok(())
}

fn read_pem_pair(dir: &Path, stem: &str) -> Result<(String, String)> {
    let cert_pem = std::fs::read_to_string(dir.join(format!("{stem}.crt")))?;
    let key_pem = std::fs::read_to_string(dir.join(format!("{stem}.key")))?;
    Ok((cert_pem, key_pem))
}

/// Persist `ca` (as `root-ca.{crt,key}`) and, if given, a server leaf (as
/// `<name>.{crt,key}`) under `dir`. Key files are written `0600` on unix.
pub fn save(dir: &Path, ca: &Ca, server: Option<(&str, &Cert)>) -> Result<()> {
    write_pem_pair(dir, "root-ca", &ca.0.cert_pem, &ca.0.key_pem)?;
    if let Some((name, cert)) = server {
        write_pem_pair(dir, name, &cert.0.cert_pem, &cert.0.key_pem)?;
    }
    Ok(())
}

/// Persist a client leaf as `<name>.{crt,key}` under `dir`.
pub fn save_client(dir: &Path, name: &str, cert: &Cert) -> Result<()> {
    write_pem_pair(dir, name, &cert.0.cert_pem, &cert.0.key_pem)
}

/// Load the CA persisted by [`save`] from `dir`.
pub fn load_ca(dir: &Path) -> Result<Ca> {
    let (cert_pem, key_pem) = read_pem_pair(dir, "root-ca")?;
    CertKeyPair::from_pem(cert_pem, key_pem).map(Ca)
}

/// Load a leaf named `name` persisted by [`save`]/[`save_client`] from `dir`.
pub fn load_cert(dir: &Path, name: &str) -> Result<Cert> {
    let (cert_pem, key_pem) = read_pem_pair(dir, name)?;
    CertKeyPair::from_pem(cert_pem, key_pem).map(Cert)
}

fn private_key_der(key_pem: &str) -> Result<rustls::pki_types::PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut key_pem.as_bytes())?
        .ok_or_else(|| Error::format("no private key found in PEM"))
}

/// Build a TLS-1.3-only `ServerConfig` that requires and verifies a client
/// certificate signed by the CA persisted in `dir`, serving the leaf named
/// `name`.
pub fn load_server_tls(dir: &Path, name: &str) -> Result<rustls::ServerConfig> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let ca = load_ca(dir)?;
    let cert = load_cert(dir, name)?;

    let mut roots = rustls::RootCertStore::empty();
    roots.add(CertificateDer::from(ca.0.der.clone()))?;
    let client_verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .map_err(|e| Error::message(e.to_string()))?;

    let key = private_key_der(&cert.0.key_pem)?;
    let certs = vec![CertificateDer::from(cert.0.der.clone())];

    let config = rustls::ServerConfig::builder_with_protocol_versions(&[&rustls::version::TLS13])
        .with_client_cert_verifier(client_verifier)
        .with_single_cert(certs, key)?;
    Ok(config)
}

/// Build a TLS-1.3-only `ClientConfig` presenting the leaf named `name` and
/// trusting only the CA persisted in `dir`, along with the [`ServerName`]
/// the client should dial (`holomush-<expected_game_id>`).
///
/// [`ServerName`]: rustls::pki_types::ServerName
pub fn load_client_tls(
    dir: &Path,
    name: &str,
    expected_game_id: &str,
) -> Result<(rustls::ClientConfig, rustls::pki_types::ServerName<'static>)> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let ca = load_ca(dir)?;
    let cert = load_cert(dir, name)?;

    let mut roots = rustls::RootCertStore::empty();
    roots.add(CertificateDer::from(ca.0.der.clone()))?;

    let key = private_key_der(&cert.0.key_pem)?;
    let certs = vec![CertificateDer::from(cert.0.der.clone())];

    let config = rustls::ClientConfig::builder_with_protocol_versions(&[&rustls::version::TLS13])
        .with_root_certificates(roots)
        .with_client_auth_cert(certs, key)?;

    let server_name =
        rustls::pki_types::ServerName::try_from(format!("holomush-{expected_game_id}"))?;
    Ok((config, server_name))
}

/// Verify `cert`'s chain of trust against `ca` (signature, validity window,
/// basic constraints) without regard to hostname or key usage.
pub fn validate_chain(cert: &Cert, ca: &Ca) -> Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let mut roots = rustls::RootCertStore::empty();
    roots.add(CertificateDer::from(ca.0.der.clone()))?;
    let verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .map_err(|e| Error::message(e.to_string()))?;

    let end_entity = CertificateDer::from(cert.0.der.clone());
    let now = rustls::pki_types::UnixTime::now();
    verifier
        .verify_client_cert(&end_entity, &[], now)
        .map_err(|_| Error::ChainInvalid)?;
    Ok(())
}

fn dns_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    if pattern == host {
        return true;
    }
    if let Some(suffix) = pattern.strip_prefix("*.") {
        if let Some(label) = host.strip_suffix(suffix) {
            return label.ends_with('.') && !label[..label.len() - 1].contains('.');
        }
    }
    false
}

/// Verify `cert` matches `host`, which may be a hostname or an IP literal.
///
/// `allow_cn_fallback` permits matching against the certificate's common
/// name when no SAN matches — off by default; see spec Open Question on CN
/// fallback, decided in `DESIGN.md`.
pub fn validate_hostname(cert: &Cert, host: &str, allow_cn_fallback: bool) -> Result<()> {
    let matched = if let Ok(ip) = host.parse::<IpAddr>() {
        cert.0.ip_sans()?.contains(&ip)
    } else {
        let host_lower = host.to_ascii_lowercase();
        cert.0
            .dns_sans()?
            .iter()
            .any(|pattern| dns_matches(pattern, &host_lower))
    };
    if matched {
        return Ok(());
    }
    if allow_cn_fallback && cert.0.common_name()?.eq_ignore_ascii_case(host) {
        return Ok(());
    }
    Err(Error::HostnameMismatch {
        host: host.to_string(),
    })
}

/// Verify `cert` carries the extended key usage required for `role`.
pub fn validate_ext_key_usage(cert: &Cert, required: ExtKeyUsage) -> Result<()> {
    if cert.0.extended_key_usage(required)? {
        Ok(())
    } else {
        Err(Error::KeyUsageMismatch {
            required: format!("{required:?}"),
        })
    }
}

/// Classify `cert`'s validity window against now, warning when fewer than
/// `warn_threshold_days` remain.
pub fn check_expiration(cert: &Cert, warn_threshold_days: i64) -> Result<ExpirationStatus> {
    let not_before = cert.0.not_before()?;
    let not_after = cert.0.not_after()?;
    let now = OffsetDateTime::now_utc();
    let days_remaining = (not_after - now).whole_days();

    if now < not_before {
        let days_until = (not_before - now).whole_days();
        return Ok(ExpirationStatus {
            expired: false,
            not_yet_valid: true,
            near_expiration: false,
            days_remaining,
            warning: None,
            error: Some(format!("not yet valid; becomes valid in {days_until} day(s)")),
        });
    }
    if now > not_after {
        let days_since = (now - not_after).whole_days();
        return Ok(ExpirationStatus {
            expired: true,
            not_yet_valid: false,
            near_expiration: false,
            days_remaining,
            warning: None,
            error: Some(format!("expired {days_since} day(s) ago")),
        });
    }
    if days_remaining <= warn_threshold_days {
        return Ok(ExpirationStatus {
            expired: false,
            not_yet_valid: false,
            near_expiration: true,
            days_remaining,
            warning: Some(format!("certificate expires in {days_remaining} day(s)")),
            error: None,
        });
    }
    Ok(ExpirationStatus {
        expired: false,
        not_yet_valid: false,
        near_expiration: false,
        days_remaining,
        warning: None,
        error: None,
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ca_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let ca = generate_ca("westmarch").unwrap();
        save(dir.path(), &ca, None).unwrap();

        let loaded = load_ca(dir.path()).unwrap();
        assert_eq!(loaded.common_name().unwrap(), "Holomush CA westmarch");
        assert_eq!(
            loaded.game_uri().unwrap().as_deref(),
            Some("holomush://game/westmarch")
        );
    }

    #[test]
    fn server_cert_carries_expected_sans_and_usage() {
        let ca = generate_ca("westmarch").unwrap();
        let cert = generate_server_cert(&ca, "westmarch", "core").unwrap();

        assert_eq!(cert.common_name().unwrap(), "holomush-core");
        assert!(cert.0.dns_sans().unwrap().contains(&"localhost".to_string()));
        assert!(cert
            .0
            .dns_sans()
            .unwrap()
            .contains(&"holomush-westmarch".to_string()));
        assert!(validate_ext_key_usage(&cert, ExtKeyUsage::ServerAuth).is_ok());
        assert!(validate_ext_key_usage(&cert, ExtKeyUsage::ClientAuth).is_err());
    }

    #[test]
    fn client_cert_has_no_dns_sans_and_client_auth_usage() {
        let ca = generate_ca("westmarch").unwrap();
        let cert = generate_client_cert(&ca, "alice").unwrap();

        assert!(cert.0.dns_sans().unwrap().is_empty());
        assert!(validate_ext_key_usage(&cert, ExtKeyUsage::ClientAuth).is_ok());
        assert!(validate_ext_key_usage(&cert, ExtKeyUsage::ServerAuth).is_err());
    }

    #[test]
    fn validate_chain_accepts_issuing_ca_and_rejects_foreign_ca() {
        let ca = generate_ca("westmarch").unwrap();
        let other_ca = generate_ca("shadowfell").unwrap();
        let cert = generate_client_cert(&ca, "alice").unwrap();

        assert!(validate_chain(&cert, &ca).is_ok());
        assert!(validate_chain(&cert, &other_ca).is_err());
    }

    #[test]
    fn validate_hostname_matches_sans_and_rejects_unrelated_host() {
        let ca = generate_ca("westmarch").unwrap();
        let cert = generate_server_cert(&ca, "westmarch", "core").unwrap();

        assert!(validate_hostname(&cert, "localhost", false).is_ok());
        assert!(validate_hostname(&cert, "holomush-westmarch", false).is_ok());
        assert!(validate_hostname(&cert, "127.0.0.1", false).is_ok());
        assert!(validate_hostname(&cert, "evil.example", false).is_err());
    }

    #[test]
    fn validate_hostname_cn_fallback_is_opt_in() {
        let ca = generate_ca("westmarch").unwrap();
        let cert = generate_client_cert(&ca, "alice").unwrap();

        assert!(validate_hostname(&cert, "holomush-alice", false).is_err());
        assert!(validate_hostname(&cert, "holomush-alice", true).is_ok());
    }

    #[test]
    fn check_expiration_flags_freshly_issued_cert_as_healthy() {
        let ca = generate_ca("westmarch").unwrap();
        let cert = generate_server_cert(&ca, "westmarch", "core").unwrap();
        let status = check_expiration(&cert, 30).unwrap();

        assert!(status.is_usable());
        assert!(!status.near_expiration);
        assert!(status.days_remaining > 300);
    }

    #[test]
    fn cert_rotation_changes_serial() {
        let ca = generate_ca("westmarch").unwrap();
        let first = generate_server_cert(&ca, "westmarch", "core").unwrap();
        let second = generate_server_cert(&ca, "westmarch", "core").unwrap();

        assert_ne!(first.serial_hex().unwrap(), second.serial_hex().unwrap());
    }

    #[test]
    fn save_and_load_server_tls_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ca = generate_ca("westmarch").unwrap();
        let server = generate_server_cert(&ca, "westmarch", "core").unwrap();
        save(dir.path(), &ca, Some(("core", &server))).unwrap();

        // Reaching this point without an error means `with_single_cert`
        // accepted the key/cert pair built from our generated PEM, and the
        // client verifier was constructed against the saved CA.
        load_server_tls(dir.path(), "core").unwrap();
    }

    #[test]
    fn save_and_load_client_tls_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ca = generate_ca("westmarch").unwrap();
        let client = generate_client_cert(&ca, "alice").unwrap();
        save(dir.path(), &ca, None).unwrap();
        save_client(dir.path(), "alice", &client).unwrap();

        let (_, server_name) = load_client_tls(dir.path(), "alice", "westmarch").unwrap();
        assert_eq!(server_name, "holomush-westmarch".try_into().unwrap());
    }
}
