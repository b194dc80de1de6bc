//! Timing behavior of the keyboard-wedge listener.
//!
//! All tests run on a paused clock so debounce windows are exact.

use std::time::Duration;

use labelcheck_core::constants::WEDGE_PREFIX;
use labelcheck_hardware::{
    BarcodeSource, DecodedBarcode, KeyEvent, KeyboardBus, NamedKey, WedgeListener,
};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

const CODE: &str = "1Z12345E0205271688";

async fn assert_no_decode(rx: &mut mpsc::Receiver<DecodedBarcode>) {
    assert!(
        timeout(Duration::from_millis(500), rx.recv()).await.is_err(),
        "unexpected decode"
    );
}

#[tokio::test(start_paused = true)]
async fn prefixed_burst_decodes_once() {
    let bus = KeyboardBus::new();
    let (mut listener, mut decoded) = WedgeListener::new();
    listener.mount(&bus);

    bus.type_str(WEDGE_PREFIX);
    bus.type_str(CODE);

    let barcode = decoded.recv().await.unwrap();
    assert_eq!(barcode.tracking_number.as_str(), CODE);
    assert_eq!(barcode.source, BarcodeSource::Wedge);
    assert_eq!(barcode.scanner_id, None);

    assert_no_decode(&mut decoded).await;
}

#[tokio::test(start_paused = true)]
async fn pause_longer_than_debounce_splits_token() {
    let bus = KeyboardBus::new();
    let (mut listener, mut decoded) = WedgeListener::new();
    listener.mount(&bus);

    bus.type_str(&CODE[..9]);
    sleep(Duration::from_millis(60)).await;
    bus.type_str(&CODE[9..]);

    assert_no_decode(&mut decoded).await;
}

#[tokio::test(start_paused = true)]
async fn pause_shorter_than_debounce_keeps_token() {
    let bus = KeyboardBus::new();
    let (mut listener, mut decoded) = WedgeListener::new();
    listener.mount(&bus);

    for c in CODE.chars() {
        bus.press(KeyEvent::Char(c));
        sleep(Duration::from_millis(20)).await;
    }

    let barcode = decoded.recv().await.unwrap();
    assert_eq!(barcode.tracking_number.as_str(), CODE);
}

#[tokio::test(start_paused = true)]
async fn noise_before_burst_is_tolerated() {
    let bus = KeyboardBus::new();
    let (mut listener, mut decoded) = WedgeListener::new();
    listener.mount(&bus);

    bus.type_str("hello");
    bus.type_str(CODE);

    let barcode = decoded.recv().await.unwrap();
    assert_eq!(barcode.tracking_number.as_str(), CODE);
}

#[tokio::test(start_paused = true)]
async fn named_keys_do_not_reach_buffer() {
    let bus = KeyboardBus::new();
    let (mut listener, mut decoded) = WedgeListener::new();
    listener.mount(&bus);

    bus.type_str(&CODE[..10]);
    bus.press(KeyEvent::Named(NamedKey::Shift));
    bus.press(KeyEvent::Named(NamedKey::Other("CapsLock".to_string())));
    bus.type_str(&CODE[10..]);
    bus.press(KeyEvent::Named(NamedKey::Enter));

    let barcode = decoded.recv().await.unwrap();
    assert_eq!(barcode.tracking_number.as_str(), CODE);
}

#[tokio::test(start_paused = true)]
async fn double_mount_subscribes_once() {
    let bus = KeyboardBus::new();
    let (mut listener, mut decoded) = WedgeListener::new();

    assert!(listener.mount(&bus));
    assert!(!listener.mount(&bus));
    assert_eq!(bus.listener_count(), 1);

    bus.type_str(CODE);

    assert!(decoded.recv().await.is_some());
    assert_no_decode(&mut decoded).await;
}

#[tokio::test(start_paused = true)]
async fn unmount_stops_decoding() {
    let bus = KeyboardBus::new();
    let (mut listener, mut decoded) = WedgeListener::new();

    assert!(!listener.unmount().await);

    listener.mount(&bus);
    assert!(listener.unmount().await);
    assert!(!listener.is_mounted());
    assert_eq!(bus.listener_count(), 0);

    bus.type_str(CODE);
    assert_no_decode(&mut decoded).await;

    assert!(listener.mount(&bus));
    bus.type_str(CODE);
    assert!(decoded.recv().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn custom_debounce_window() {
    let bus = KeyboardBus::new();
    let (mut listener, mut decoded) = WedgeListener::with_debounce(Duration::from_millis(200));
    assert_eq!(listener.debounce(), Duration::from_millis(200));
    listener.mount(&bus);

    bus.type_str(&CODE[..9]);
    sleep(Duration::from_millis(120)).await;
    bus.type_str(&CODE[9..]);

    assert!(decoded.recv().await.is_some());
}
