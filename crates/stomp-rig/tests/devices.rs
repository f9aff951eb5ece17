//! Device lifecycle tests against the mock backend.
//!
//! Input opens are single-flight, device failures leave the chain and the
//! current streams alone, and audio flows from the input stream through the
//! graph to the output callback.

use std::sync::Arc;
use std::time::Duration;
use stomp_core::AudioContext;
use stomp_effects::Tremolo;
use stomp_io::{DeviceInfo, DeviceKind, MockBackend};
use stomp_rig::{ChainManager, RigError};

const WAIT: Duration = Duration::from_secs(5);

fn backend() -> Arc<MockBackend> {
    Arc::new(MockBackend::with_devices(vec![
        DeviceInfo::new("input-0", "Guitar In", DeviceKind::Input),
        DeviceInfo::new("output-0", "Headphones", DeviceKind::Output),
        DeviceInfo::new("output-1", "Monitors", DeviceKind::Output),
    ]))
}

#[test]
fn audio_flows_from_input_to_output() {
    let backend = backend();
    let ctx = AudioContext::new(48000.0);
    let mut chain = ChainManager::new(&ctx);

    chain.switch_output(backend.as_ref(), None).unwrap();
    assert!(chain.request_input(backend.clone(), Some("Guitar In")));
    assert!(chain.wait_input(WAIT));
    assert!(chain.has_input());
    assert_eq!(chain.input_device(), Some("Guitar In"));

    assert!(backend.feed(vec![0.5; 256]));
    let out = backend.pull(256).unwrap();
    assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
}

#[test]
fn same_input_is_not_reopened() {
    let backend = backend();
    let ctx = AudioContext::new(48000.0);
    let mut chain = ChainManager::new(&ctx);

    assert!(chain.request_input(backend.clone(), Some("Guitar In")));
    assert!(chain.wait_input(WAIT));
    assert!(!chain.request_input(backend.clone(), Some("Guitar In")));
    assert_eq!(backend.opened_inputs().len(), 1);
}

#[test]
fn input_open_is_single_flight() {
    let backend = Arc::new(MockBackend::new().with_open_delay(Duration::from_millis(200)));
    let ctx = AudioContext::new(48000.0);
    let mut chain = ChainManager::new(&ctx);

    assert!(chain.request_input(backend.clone(), None));
    assert!(!chain.request_input(backend.clone(), Some("Mock Input")));
    assert!(chain.wait_input(WAIT));
    assert_eq!(backend.opened_inputs(), vec![None]);
}

#[test]
fn denied_input_leaves_chain_untouched() {
    let backend = Arc::new(MockBackend::new().deny_input());
    let ctx = AudioContext::new(48000.0);
    let mut chain = ChainManager::new(&ctx);
    chain.add_effect(Tremolo::new(&ctx).into(), true);
    let edges = ctx.edge_count();

    assert!(chain.request_input(backend, None));
    assert!(!chain.wait_input(WAIT));
    assert!(!chain.has_input());
    assert_eq!(chain.models(), ["tremolo"]);
    assert_eq!(ctx.edge_count(), edges);
}

#[test]
fn output_switch_replaces_stream() {
    let backend = backend();
    let ctx = AudioContext::new(48000.0);
    let mut chain = ChainManager::new(&ctx);
    chain.add_effect(Tremolo::new(&ctx).into(), true);

    chain.switch_output(backend.as_ref(), Some("Headphones")).unwrap();
    chain.switch_output(backend.as_ref(), Some("Monitors")).unwrap();

    assert_eq!(chain.output_device(), Some("Monitors"));
    assert_eq!(
        backend.opened_outputs(),
        vec![Some("Headphones".to_string()), Some("Monitors".to_string())]
    );
    assert!(backend.output_live());
    assert_eq!(ctx.outputs(ctx.line_in()).len(), 1);
}

#[test]
fn failed_output_switch_keeps_previous() {
    let backend = backend();
    let ctx = AudioContext::new(48000.0);
    let mut chain = ChainManager::new(&ctx);
    chain.switch_output(backend.as_ref(), Some("Headphones")).unwrap();
    let edges = ctx.edge_count();

    let err = chain
        .switch_output(backend.as_ref(), Some("Studio Monitors"))
        .unwrap_err();
    assert!(matches!(err, RigError::Device(stomp_io::Error::DeviceNotFound(_))));
    assert_eq!(chain.output_device(), Some("Headphones"));
    assert!(backend.output_live());
    assert_eq!(ctx.edge_count(), edges);
}

#[test]
fn previous_output_resumes_rendering_after_failed_switch() {
    let backend = backend();
    let ctx = AudioContext::new(48000.0);
    let mut chain = ChainManager::new(&ctx);
    chain.switch_output(backend.as_ref(), Some("Headphones")).unwrap();
    assert!(chain.request_input(backend.clone(), Some("Guitar In")));
    assert!(chain.wait_input(WAIT));

    assert!(
        chain
            .switch_output(backend.as_ref(), Some("Studio Monitors"))
            .is_err()
    );

    assert!(backend.feed(vec![0.5; 256]));
    let out = backend.pull(256).unwrap();
    assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
}
