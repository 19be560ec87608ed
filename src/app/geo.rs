use anyhow::Result;

/// Coarse location attached to each recorded view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: String,
    pub city: String,
    pub region: String,
}

impl GeoLocation {
    pub fn unknown() -> Self {
        Self {
            country: "Unknown".to_string(),
            city: "Unknown".to_string(),
            region: "Unknown".to_string(),
        }
    }
}

/// Best-effort IP geolocation. Implementations talk to whatever upstream
/// service is configured; view recording never fails because of them.
pub trait GeoLocator: Send + Sync {
    fn locate(&self, ip_address: &str) -> Result<GeoLocation>;
}

/// Degrades every lookup to "Unknown". Used until a real backend is wired in.
pub struct NullGeoLocator;

impl GeoLocator for NullGeoLocator {
    fn locate(&self, _ip_address: &str) -> Result<GeoLocation> {
        Ok(GeoLocation::unknown())
    }
}

/// Resolve `ip_address` through the configured locator, degrading to
/// "Unknown" for private/loopback addresses and on lookup failure.
pub fn lookup(geo: &dyn GeoLocator, ip_address: &str) -> GeoLocation {
    if is_private_or_loopback(ip_address) {
        return GeoLocation::unknown();
    }
    match geo.locate(ip_address) {
        Ok(location) => location,
        Err(err) => {
            tracing::debug!(error = ?err, ip_address, "geolocation lookup failed");
            GeoLocation::unknown()
        }
    }
}

fn is_private_or_loopback(ip_address: &str) -> bool {
    ip_address.is_empty()
        || ip_address == "unknown"
        || ip_address == "::1"
        || ip_address == "0:0:0:0:0:0:0:1"
        || ip_address.starts_with("127.")
        || ip_address.starts_with("192.168.")
        || ip_address.starts_with("10.")
}
