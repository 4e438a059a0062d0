//! Integration tests for device caching and selector-dependent
//! invalidation.

use std::sync::Arc;

use instr_core::device::Device;
use instr_core::instrument::Instrument;
use instr_core::mock::MockTransport;
use instr_core::{Value, ValueType};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A multiplexed DMM: `volt` reads whichever channel `chan` selects.
fn switched_dmm() -> (Instrument, Arc<MockTransport>) {
    let transport = Arc::new(
        MockTransport::new("dmm")
            .with_register("SENSe1:VOLTage", "0.5")
            .with_register("SENSe2:VOLTage", "0.75"),
    );
    let instr = Instrument::builder("dmm1", transport.clone())
        .device(
            Device::scpi("chan", "ROUTe:CHANnel")
                .vtype(ValueType::Int)
                .range(1.0, 4.0)
                .build(),
        )
        .device(
            Device::scpi_get("volt", "SENSe{ch}:VOLTage?")
                .option_device("ch", "chan")
                .build(),
        )
        .build();
    (instr, transport)
}

#[tokio::test]
async fn setting_a_selector_clears_dependent_caches() {
    init_logs();
    let (instr, _) = switched_dmm();
    let chan = instr.device("chan").unwrap();
    let volt = instr.device("volt").unwrap();

    chan.set(Value::Int(1)).await.unwrap();
    assert_eq!(volt.get().await.unwrap(), Value::Float(0.5));
    assert_eq!(volt.device().cached(), Some(Value::Float(0.5)));

    chan.set(Value::Int(2)).await.unwrap();
    assert_eq!(volt.device().cached(), None);
    // the next cached read goes back to hardware, on the new channel
    assert_eq!(volt.getcache().await.unwrap(), Some(Value::Float(0.75)));
}

#[tokio::test]
async fn selector_setcache_also_clears_dependent_caches() {
    init_logs();
    let (instr, _) = switched_dmm();
    let chan = instr.device("chan").unwrap();
    let volt = instr.device("volt").unwrap();

    chan.set(Value::Int(1)).await.unwrap();
    volt.get().await.unwrap();
    assert!(volt.device().cached().is_some());

    // a cache-only selector change still stales the dependents
    chan.setcache(Value::Int(2)).unwrap();
    assert_eq!(volt.device().cached(), None);
    assert_eq!(volt.get().await.unwrap(), Value::Float(0.75));
}

#[tokio::test]
async fn getcache_yields_none_while_the_selector_is_unset() {
    init_logs();
    let (instr, transport) = switched_dmm();
    let chan = instr.device("chan").unwrap();
    let volt = instr.device("volt").unwrap();

    // no channel selected yet: the autoinit read finds the value
    // unobtainable, which is not an error
    assert_eq!(volt.getcache().await.unwrap(), None);
    assert_eq!(transport.ask_log().len(), 0);

    chan.set(Value::Int(1)).await.unwrap();
    assert_eq!(volt.getcache().await.unwrap(), Some(Value::Float(0.5)));
}
