use crate::AudioError;
use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

fn get_host() -> cpal::Host {
    cpal::default_host()
}

/// An input device as shown by `speaking-coach devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    pub name: String,
    pub channels: u16,
    pub sample_rate: u32,
    pub is_default: bool,
}

impl std::fmt::Display for InputDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            " * {}({}ch, {}hz)",
            self.name, self.channels, self.sample_rate
        )?;
        if self.is_default {
            f.write_str(" [default]")?;
        }
        Ok(())
    }
}

/// Finds the input device with the given name, or the host's default input
/// device when no name is given.
pub fn get_or_default_input(device_name: Option<&str>) -> Result<Device, AudioError> {
    let host = get_host();
    tracing::debug!("Host: {:?}", host.id());

    let Some(target) = device_name else {
        return host.default_input_device().ok_or(AudioError::NoDefaultDevice);
    };

    let input_devices = host
        .input_devices()
        .map_err(|e| AudioError::Device(e.to_string()))?;
    for in_device in input_devices {
        if in_device.name().is_ok_and(|name| name == target) {
            return Ok(in_device);
        }
    }
    Err(AudioError::DeviceNotFound(target.to_string()))
}

/// Lists input devices with their default capture format. Devices that
/// cannot report a name or config are skipped.
pub fn get_available_inputs() -> Result<Vec<InputDeviceInfo>, AudioError> {
    for host in cpal::available_hosts() {
        tracing::debug!("Available host: {:?}", host);
    }

    let host = get_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());
    let input_devices = host
        .input_devices()
        .map_err(|e| AudioError::Device(e.to_string()))?;

    let mut devices = Vec::new();
    for in_device in input_devices {
        let Ok(name) = in_device.name() else {
            continue;
        };
        let cfg = match in_device.default_input_config() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", name, e);
                continue;
            }
        };
        devices.push(InputDeviceInfo {
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
            channels: cfg.channels(),
            sample_rate: cfg.sample_rate().0,
        });
    }
    Ok(devices)
}
