//! Bridge commands
//! This module maps the named commands the host runtime sends onto the
//! adapter session, independent of the transport that carries them.

use std::str::FromStr;

use log::debug;
use serde_json::{json, Value};

use crate::error::{BridgeError, Result};
use crate::state::AppState;

/// Every command name the host runtime may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    IsAvailable,
    IsOn,
    IsEnabled,
    OpenSettings,
    RequestEnable,
    RequestDisable,
    EnsurePermissions,
    GetState,
    GetAdapterStatus,
    GetAddress,
    GetName,
    SetName,
    GetDeviceBondState,
    RemoveDeviceBond,
    BondDevice,
    PairingRequestHandlingEnable,
    PairingRequestHandlingDisable,
    GetBondedDevices,
    IsDiscovering,
    StartDiscovery,
    CancelDiscovery,
    IsDiscoverable,
    RequestDiscoverable,
    Connect,
    Write,
}

impl Method {
    pub const ALL: [Method; 25] = [
        Method::IsAvailable,
        Method::IsOn,
        Method::IsEnabled,
        Method::OpenSettings,
        Method::RequestEnable,
        Method::RequestDisable,
        Method::EnsurePermissions,
        Method::GetState,
        Method::GetAdapterStatus,
        Method::GetAddress,
        Method::GetName,
        Method::SetName,
        Method::GetDeviceBondState,
        Method::RemoveDeviceBond,
        Method::BondDevice,
        Method::PairingRequestHandlingEnable,
        Method::PairingRequestHandlingDisable,
        Method::GetBondedDevices,
        Method::IsDiscovering,
        Method::StartDiscovery,
        Method::CancelDiscovery,
        Method::IsDiscoverable,
        Method::RequestDiscoverable,
        Method::Connect,
        Method::Write,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::IsAvailable => "isAvailable",
            Self::IsOn => "isOn",
            Self::IsEnabled => "isEnabled",
            Self::OpenSettings => "openSettings",
            Self::RequestEnable => "requestEnable",
            Self::RequestDisable => "requestDisable",
            Self::EnsurePermissions => "ensurePermissions",
            Self::GetState => "getState",
            Self::GetAdapterStatus => "getAdapterStatus",
            Self::GetAddress => "getAddress",
            Self::GetName => "getName",
            Self::SetName => "setName",
            Self::GetDeviceBondState => "getDeviceBondState",
            Self::RemoveDeviceBond => "removeDeviceBond",
            Self::BondDevice => "bondDevice",
            Self::PairingRequestHandlingEnable => "pairingRequestHandlingEnable",
            Self::PairingRequestHandlingDisable => "pairingRequestHandlingDisable",
            Self::GetBondedDevices => "getBondedDevices",
            Self::IsDiscovering => "isDiscovering",
            Self::StartDiscovery => "startDiscovery",
            Self::CancelDiscovery => "cancelDiscovery",
            Self::IsDiscoverable => "isDiscoverable",
            Self::RequestDiscoverable => "requestDiscoverable",
            Self::Connect => "connect",
            Self::Write => "write",
        }
    }

    /// Why the platform cannot perform this command, or `None` when it can.
    pub fn unsupported_reason(self) -> Option<&'static str> {
        match self {
            Self::OpenSettings | Self::RequestEnable | Self::RequestDisable => {
                Some("the adapter can only be toggled from the system settings")
            }
            Self::EnsurePermissions => Some("permission prompts are handled by the host application"),
            Self::SetName => Some("the device name cannot be modified from an application"),
            Self::RemoveDeviceBond | Self::BondDevice => Some("bonding is managed by the system"),
            Self::PairingRequestHandlingEnable | Self::PairingRequestHandlingDisable => {
                Some("pairing requests cannot be intercepted")
            }
            Self::IsDiscoverable | Self::RequestDiscoverable => {
                Some("the adapter's discoverable mode is not exposed")
            }
            Self::Connect | Self::Write => Some("serial transport is not available"),
            _ => None,
        }
    }
}

impl FromStr for Method {
    type Err = BridgeError;

    fn from_str(name: &str) -> Result<Self> {
        Method::ALL
            .into_iter()
            .find(|method| method.name() == name)
            .ok_or_else(|| BridgeError::UnknownCommand(name.to_string()))
    }
}

/// Runs a named command against the adapter session.
///
/// `arguments` is the raw argument value sent by the host; only
/// `getDeviceBondState` reads it, as the device identifier string.
pub fn dispatch(app_state: &AppState, method: &str, arguments: &Value) -> Result<Value> {
    let method: Method = method.parse()?;
    debug!("{} called.", method.name());

    if let Some(reason) = method.unsupported_reason() {
        return Err(BridgeError::unsupported(method.name(), reason));
    }

    let manager = app_state.bluetooth_manager()?;
    let result = match method {
        Method::IsAvailable => json!(manager.is_available()),
        Method::IsOn | Method::IsEnabled => json!(manager.is_on()),
        Method::GetState | Method::GetAdapterStatus => json!(manager.adapter_status()),
        Method::GetAddress => json!(configured(method, manager.config().adapter_address.as_deref())?),
        Method::GetName => json!(configured(method, manager.config().adapter_name.as_deref())?),
        Method::GetDeviceBondState => {
            let identifier = arguments.as_str().unwrap_or_default();
            json!(manager.device_bond_state(identifier))
        }
        Method::GetBondedDevices => json!(manager.bonded_devices()),
        Method::IsDiscovering => json!(manager.is_discovering()),
        Method::StartDiscovery => {
            manager.start_discovery();
            Value::Null
        }
        Method::CancelDiscovery => {
            manager.cancel_discovery();
            Value::Null
        }
        _ => return Err(BridgeError::unsupported(method.name(), "not implemented")),
    };
    Ok(result)
}

fn configured(method: Method, value: Option<&str>) -> Result<String> {
    value
        .map(str::to_string)
        .ok_or_else(|| BridgeError::unsupported(method.name(), "not provided by the host configuration"))
}
