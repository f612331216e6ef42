//! System construction and the top-level `System` type.
//!
//! This module builds a complete system from configuration. It performs:
//! 1. **Validation:** The whole configuration is checked before anything is bound.
//! 2. **Control planes:** Each configured control plane is created and bound to a fresh network.
//! 3. **Bus setup:** The adaptor's selector and window, and every remapped window, are placed
//!    on the primary bus.

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, ConfigError, ControlPlaneConfig, CpKind};
use crate::cp::{
    BasicControlPlane, ControlPlane, ControlPlaneHandle, GeneralControlPlane, SharedControlPlane,
    share,
};
use crate::mgmt::AdaptorDriver;
use crate::net::ControlPlaneNetwork;
use crate::soc::devices::{
    AdaptorSelectorPort, AdaptorWindowPort, AddressRemapper, ControlPlaneAdaptor, RemappedWindow,
};
use crate::soc::interconnect::Bus;

/// A control plane kept by the system, typed by variant.
#[derive(Debug, Clone)]
pub enum SystemControlPlane {
    /// Header-only control plane.
    Basic(ControlPlaneHandle<BasicControlPlane>),
    /// Control plane with tables.
    General(ControlPlaneHandle<GeneralControlPlane>),
}

impl SystemControlPlane {
    fn build(config: &ControlPlaneConfig) -> Result<Self, ConfigError> {
        let identity = config.identity()?;
        Ok(match config.kind {
            CpKind::Basic => Self::Basic(share(BasicControlPlane::new(identity))),
            CpKind::General => Self::General(share(GeneralControlPlane::new(
                identity,
                config.layout(),
            )?)),
        })
    }

    /// IDENT of the control plane.
    pub fn ident(&self) -> String {
        match self {
            Self::Basic(cp) => cp.lock().identity().ident().to_owned(),
            Self::General(cp) => cp.lock().identity().ident().to_owned(),
        }
    }

    /// The control plane as the network sees it.
    pub fn shared(&self) -> SharedControlPlane {
        match self {
            Self::Basic(cp) => cp.clone(),
            Self::General(cp) => cp.clone(),
        }
    }

    /// The general control plane, if this is one.
    pub const fn as_general(&self) -> Option<&ControlPlaneHandle<GeneralControlPlane>> {
        match self {
            Self::General(cp) => Some(cp),
            Self::Basic(_) => None,
        }
    }
}

/// Top-level system: the network, its adaptor, and the primary bus they hang off.
#[derive(Debug)]
pub struct System {
    /// Primary system bus holding the adaptor BARs and remapped windows.
    pub bus: Bus,
    /// The control-plane network.
    pub network: Arc<ControlPlaneNetwork>,
    /// The selector + window adaptor.
    pub adaptor: Arc<ControlPlaneAdaptor>,
    /// Control planes in configuration order.
    pub control_planes: Vec<SystemControlPlane>,
    driver: AdaptorDriver,
}

impl System {
    /// Builds a system from configuration.
    ///
    /// # Errors
    ///
    /// Any validation failure, or a bus or network bind failure.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut builder = ControlPlaneNetwork::builder();
        let mut control_planes = Vec::with_capacity(config.control_planes.len());
        for cp_config in &config.control_planes {
            let cp = SystemControlPlane::build(cp_config)?;
            builder.bind(cp.shared())?;
            control_planes.push(cp);
        }
        let network = Arc::new(builder.build());

        let adaptor = Arc::new(ControlPlaneAdaptor::new(
            network.clone(),
            config.adaptor.window_size,
        ));

        let mut bus = Bus::new();
        bus.add_device(Box::new(AdaptorSelectorPort::new(
            adaptor.clone(),
            config.adaptor.selector_base,
        )))?;
        bus.add_device(Box::new(AdaptorWindowPort::new(
            adaptor.clone(),
            config.adaptor.window_base,
        )))?;
        for r in &config.remappers {
            let remapper = AddressRemapper::new(&r.name, r.range_start, r.range_size, r.base());
            bus.add_device(Box::new(RemappedWindow::new(remapper, network.clone())))?;
        }

        info!(
            control_planes = control_planes.len(),
            devices = ?bus.device_names(),
            "system built"
        );
        Ok(Self {
            bus,
            network,
            driver: AdaptorDriver::new(adaptor.clone()),
            adaptor,
            control_planes,
        })
    }

    /// Control plane with the given IDENT.
    pub fn control_plane(&self, ident: &str) -> Option<&SystemControlPlane> {
        self.control_planes.iter().find(|cp| cp.ident() == ident)
    }

    /// General control plane with the given IDENT.
    pub fn general(&self, ident: &str) -> Option<&ControlPlaneHandle<GeneralControlPlane>> {
        self.control_plane(ident).and_then(SystemControlPlane::as_general)
    }

    /// A serializing driver for the adaptor; every driver handed out shares one lock.
    pub fn driver(&self) -> AdaptorDriver {
        self.driver.clone()
    }
}
