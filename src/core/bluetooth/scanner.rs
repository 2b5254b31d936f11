//! Platform radio backed by the bluest library.
//! Adapter availability and scan results are forwarded to the session's
//! delegate from background tasks.

use std::sync::{Mutex, PoisonError, Weak};

use anyhow::{anyhow, Result};
use bluest::{Adapter, AdapterEvent, AdvertisingDevice, Device};
use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::radio::{RadioDelegate, RadioDriver};
use crate::core::bluetooth::types::{Advertisement, ConnectionState, DeviceType};

/// Raw CoreBluetooth-style state reported while the adapter is usable
const RAW_STATE_POWERED_ON: i32 = 5;
/// Raw CoreBluetooth-style state reported while the adapter is not usable
const RAW_STATE_POWERED_OFF: i32 = 4;

pub struct BluestRadio {
    adapter: Adapter,
    runtime: Handle,
    delegate: Mutex<Option<Weak<dyn RadioDelegate>>>,
    events_task: Mutex<Option<JoinHandle<()>>>,
    cancel_token: Mutex<CancellationToken>,
}

impl BluestRadio {
    /// Opens the default adapter. Must be called from within a tokio runtime.
    pub async fn new() -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| anyhow!("No Bluetooth adapter found"))?;
        info!("Bluetooth adapter opened.");
        Ok(Self {
            adapter,
            runtime: Handle::current(),
            delegate: Mutex::new(None),
            events_task: Mutex::new(None),
            cancel_token: Mutex::new(CancellationToken::new()),
        })
    }

    fn delegate(&self) -> Option<Weak<dyn RadioDelegate>> {
        self.delegate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reports the current availability, then every change, until the stream ends.
    async fn watch_adapter(adapter: Adapter, delegate: Weak<dyn RadioDelegate>) -> Result<()> {
        let raw_state = if adapter.is_available().await? {
            RAW_STATE_POWERED_ON
        } else {
            RAW_STATE_POWERED_OFF
        };
        report_state(&delegate, raw_state);

        let mut events = adapter.events().await?;
        while let Some(event) = events.next().await {
            match event? {
                AdapterEvent::Available => report_state(&delegate, RAW_STATE_POWERED_ON),
                AdapterEvent::Unavailable => report_state(&delegate, RAW_STATE_POWERED_OFF),
            }
        }
        info!("Adapter event stream has ended.");
        Ok(())
    }

    /// Reports already connected devices, then streams advertisements until cancelled.
    async fn internal_scan_task(
        adapter: Adapter,
        delegate: Weak<dyn RadioDelegate>,
        cancel_token: CancellationToken,
    ) -> Result<()> {
        info!("Checking for connected devices");
        for device in adapter.connected_devices().await? {
            let rssi = device.rssi().await.unwrap_or(0);
            report_device(&delegate, describe_device(&device, None, rssi).await);
        }

        info!("Starting bluetooth scan");
        let mut scan_stream = adapter.scan(&[]).await?;

        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered_device) => {
                            debug!("Found device - Device: {:?}, RSSI: {:?}", discovered_device.device, discovered_device.rssi);
                            report_device(&delegate, describe_advertising(discovered_device).await);
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }
        Ok(())
    }
}

impl RadioDriver for BluestRadio {
    fn attach(&self, delegate: Weak<dyn RadioDelegate>) {
        *self.delegate.lock().unwrap_or_else(PoisonError::into_inner) = Some(delegate.clone());

        let adapter = self.adapter.clone();
        let handle = self.runtime.spawn(async move {
            if let Err(e) = Self::watch_adapter(adapter, delegate).await {
                error!("Adapter watch finished with an error: {:?}", e);
            }
        });
        if let Some(previous) = self
            .events_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle)
        {
            previous.abort();
        }
    }

    fn start_scan(&self) {
        let Some(delegate) = self.delegate() else {
            warn!("Scan requested before a delegate was attached.");
            return;
        };

        let cancel_token = CancellationToken::new();
        let previous = std::mem::replace(
            &mut *self.cancel_token.lock().unwrap_or_else(PoisonError::into_inner),
            cancel_token.clone(),
        );
        previous.cancel();

        let adapter = self.adapter.clone();
        self.runtime.spawn(async move {
            match Self::internal_scan_task(adapter, delegate.clone(), cancel_token.clone()).await {
                Ok(_) => info!("Scan task finished."),
                Err(e) => error!("Scan task finished with an error: {:?}", e),
            }
            if !cancel_token.is_cancelled() {
                if let Some(delegate) = delegate.upgrade() {
                    delegate.on_scan_stopped();
                }
            }
        });
        info!("Device scan task started.");
    }

    fn stop_scan(&self) {
        info!("Stopping Bluetooth scan.");
        self.cancel_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

impl Drop for BluestRadio {
    fn drop(&mut self) {
        self.cancel_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        if let Some(handle) = self
            .events_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

fn report_state(delegate: &Weak<dyn RadioDelegate>, raw_state: i32) {
    if let Some(delegate) = delegate.upgrade() {
        delegate.on_state_changed(raw_state);
    }
}

fn report_device(delegate: &Weak<dyn RadioDelegate>, advertisement: Advertisement) {
    if let Some(delegate) = delegate.upgrade() {
        delegate.on_device_discovered(advertisement);
    }
}

async fn describe_advertising(discovered: AdvertisingDevice) -> Advertisement {
    let rssi = discovered.rssi.unwrap_or_default();
    describe_device(&discovered.device, discovered.adv_data.local_name, rssi).await
}

async fn describe_device(device: &Device, advertised_name: Option<String>, rssi: i16) -> Advertisement {
    let name = advertised_name.or_else(|| device.name().ok());
    let connection_state = if device.is_connected().await {
        ConnectionState::Connected
    } else {
        ConnectionState::Disconnected
    };
    Advertisement {
        identifier: device.id().to_string(),
        name,
        rssi,
        connection_state,
        device_type: DeviceType::LowEnergy,
    }
}
