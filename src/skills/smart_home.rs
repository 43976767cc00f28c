//! Smart-home control skill (simulation)
//!
//! Controls a fixed table of virtual devices in memory.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::nlp::{Entities, Intent};
use crate::skills::SkillHandler;
use crate::{Error, Result};

/// A simulated device
#[derive(Debug, Clone)]
enum Device {
    Light { on: bool, brightness: u8 },
    Thermostat { on: bool, temperature: i64 },
    GarageDoor { open: bool },
}

/// Simulated smart-home device registry
pub struct SmartHome {
    devices: Mutex<BTreeMap<String, Device>>,
}

impl Default for SmartHome {
    fn default() -> Self {
        Self::new()
    }
}

impl SmartHome {
    /// Create the registry with the default device table
    #[must_use]
    pub fn new() -> Self {
        let mut devices = BTreeMap::new();
        devices.insert(
            "living_room_light".to_string(),
            Device::Light {
                on: false,
                brightness: 0,
            },
        );
        devices.insert(
            "bedroom_light".to_string(),
            Device::Light {
                on: false,
                brightness: 0,
            },
        );
        devices.insert(
            "thermostat".to_string(),
            Device::Thermostat {
                on: false,
                temperature: 20,
            },
        );
        devices.insert(
            "garage_door".to_string(),
            Device::GarageDoor { open: false },
        );

        Self {
            devices: Mutex::new(devices),
        }
    }

    /// Turn on the light in a room, or every light when no room is named
    ///
    /// # Errors
    ///
    /// Returns error if the device table lock is poisoned
    pub fn turn_on_light(&self, room: Option<&str>) -> Result<String> {
        self.set_lights(room, true)
    }

    /// Turn off the light in a room, or every light when no room is named
    ///
    /// # Errors
    ///
    /// Returns error if the device table lock is poisoned
    pub fn turn_off_light(&self, room: Option<&str>) -> Result<String> {
        self.set_lights(room, false)
    }

    fn set_lights(&self, room: Option<&str>, on: bool) -> Result<String> {
        let mut devices = self.lock()?;
        let verb = if on { "on" } else { "off" };

        let Some(room) = room else {
            let mut count = 0;
            for device in devices.values_mut() {
                if let Device::Light { on: state, brightness } = device {
                    *state = on;
                    *brightness = if on { 100 } else { 0 };
                    count += 1;
                }
            }
            let plural = if count == 1 { "" } else { "s" };
            return Ok(format!("Turned {verb} {count} light{plural}."));
        };

        let key = format!("{}_light", room.replace(' ', "_"));
        match devices.get_mut(&key) {
            Some(Device::Light { on: state, brightness }) => {
                *state = on;
                *brightness = if on { 100 } else { 0 };
                Ok(format!("Turned {verb} the {room} light."))
            }
            _ => Ok(format!(
                "I couldn't find a light in the {room}. Available rooms: living room, bedroom."
            )),
        }
    }

    /// Set the thermostat target temperature in degrees Celsius
    ///
    /// # Errors
    ///
    /// Returns error if the device table lock is poisoned
    pub fn set_temperature(&self, temperature: i64) -> Result<String> {
        if !(10..=35).contains(&temperature) {
            return Ok("Temperature should be between 10 and 35 degrees Celsius.".to_string());
        }

        let mut devices = self.lock()?;
        match devices.get_mut("thermostat") {
            Some(Device::Thermostat { on, temperature: target }) => {
                *on = true;
                *target = temperature;
                Ok(format!("Set thermostat to {temperature} degrees Celsius."))
            }
            _ => Ok("I couldn't find the thermostat.".to_string()),
        }
    }

    /// Summarize the state of every device
    ///
    /// # Errors
    ///
    /// Returns error if the device table lock is poisoned
    pub fn status(&self) -> Result<String> {
        let devices = self.lock()?;

        let mut lights_on = Vec::new();
        let mut lights_off = Vec::new();
        let mut lines = vec!["Here's your smart home status:".to_string()];

        for (name, device) in devices.iter() {
            match device {
                Device::Light { on, brightness } => {
                    let room = name.trim_end_matches("_light").replace('_', " ");
                    if *on {
                        lights_on.push(format!("{room} ({brightness}%)"));
                    } else {
                        lights_off.push(room);
                    }
                }
                Device::Thermostat { on, temperature } => {
                    let state = if *on { "on" } else { "off" };
                    lines.push(format!("Thermostat: {temperature}°C ({state})"));
                }
                Device::GarageDoor { open } => {
                    let state = if *open { "open" } else { "closed" };
                    lines.push(format!("Garage door: {state}"));
                }
            }
        }

        if !lights_on.is_empty() {
            lines.insert(1, format!("Lights on: {}", lights_on.join(", ")));
        }
        if !lights_off.is_empty() {
            lines.push(format!("Lights off: {}", lights_off.join(", ")));
        }

        Ok(lines.join("\n"))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Device>>> {
        self.devices
            .lock()
            .map_err(|_| Error::Skill("device table poisoned".to_string()))
    }
}

#[async_trait]
impl SkillHandler for SmartHome {
    async fn handle(
        &self,
        intent: &Intent,
        entities: &Entities,
        _raw_text: &str,
    ) -> Result<String> {
        match intent {
            Intent::LightOn => self.turn_on_light(entities.room.as_deref()),
            Intent::LightOff => self.turn_off_light(entities.room.as_deref()),
            Intent::TemperatureSet => entities.number.map_or_else(
                || Ok("What temperature would you like to set?".to_string()),
                |n| self.set_temperature(n),
            ),
            Intent::DeviceStatus => self.status(),
            _ => Ok("I'm not sure what you want to do with your devices.".to_string()),
        }
    }
}
