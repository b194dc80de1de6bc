//! Forward a key source into the keyboard bus.

use tracing::{debug, info, warn};

use crate::bus::KeyboardBus;
use crate::devices::AnyKeySource;
use crate::traits::KeySource;
use crate::{HardwareError, Result};

/// Read keys from `source` and publish them on `bus` until the source ends.
///
/// A source reaching end of input returns `Ok(())`. Any other failure is
/// logged and returned.
///
/// # Examples
///
/// ```
/// use labelcheck_hardware::{KeyboardBus, pump_keys};
/// use labelcheck_hardware::devices::AnyKeySource;
/// use labelcheck_hardware::traits::KeyEvent;
///
/// #[tokio::main]
/// async fn main() -> labelcheck_hardware::Result<()> {
///     let bus = KeyboardBus::new();
///     let mut keys = bus.subscribe();
///
///     pump_keys(AnyKeySource::reader("fixture", &b"ok"[..]), bus).await?;
///
///     assert_eq!(keys.recv().await.unwrap(), KeyEvent::Char('o'));
///     assert_eq!(keys.recv().await.unwrap(), KeyEvent::Char('k'));
///     Ok(())
/// }
/// ```
pub async fn pump_keys(mut source: AnyKeySource, bus: KeyboardBus) -> Result<()> {
    info!(source = source.name(), "Key source started");

    loop {
        match source.next_key().await {
            Ok(key) => {
                bus.press(key);
            }
            Err(HardwareError::Disconnected { device }) => {
                debug!(source = %device, "Key source ended");
                return Ok(());
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "Key source failed");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockKeySource;
    use crate::traits::{KeyEvent, NamedKey};

    #[tokio::test]
    async fn test_pump_forwards_until_disconnect() {
        let bus = KeyboardBus::new();
        let mut keys = bus.subscribe();
        let (keyboard, handle) = MockKeySource::new();

        let pump = tokio::spawn(pump_keys(AnyKeySource::Mock(keyboard), bus));

        handle.type_line("1Z").await.unwrap();
        drop(handle);

        pump.await.unwrap().unwrap();

        assert_eq!(keys.recv().await.unwrap(), KeyEvent::Char('1'));
        assert_eq!(keys.recv().await.unwrap(), KeyEvent::Char('Z'));
        assert_eq!(keys.recv().await.unwrap(), KeyEvent::Named(NamedKey::Enter));
    }
}
