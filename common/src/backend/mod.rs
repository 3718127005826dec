// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

mod simulatedplant;

pub use simulatedplant::SimulatedPlant;

#[cfg(feature = "http")]
mod httpbackend;

#[cfg(feature = "http")]
pub use httpbackend::HttpBackend;

#[cfg(feature = "http")]
pub(crate) use httpbackend::HttpEndpoint;

use scada_dashboard_model::StatusBackendPointer;

use crate::config::DashboardConfig;

/// Creates the backend described by `config`.
///
/// A configured base URL selects the REST backend, otherwise the dashboard runs
/// against the simulated plant.
pub fn build_backend(config: &DashboardConfig) -> Result<StatusBackendPointer, serde_json::Error> {
    #[cfg(feature = "http")]
    if let Some(url) = &config.backend_url {
        log::info!("using backend at {url}");
        return Ok(Box::new(HttpBackend::new(url, config.http_timeout)));
    }

    #[cfg(not(feature = "http"))]
    if config.backend_url.is_some() {
        log::warn!("built without the http feature, falling back to the simulated plant");
    }

    log::info!("using the simulated plant");
    Ok(Box::new(SimulatedPlant::new()?))
}
