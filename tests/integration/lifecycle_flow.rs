use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use paretrace_fastforward::{
    fastforward::{
        Activation, ForwardTarget, Lifecycle, LifecycleState, RawParams, RecordingForwarder,
        ResumeOutcome,
    },
    launcher::{
        config::{LauncherConfig, TeardownSection},
        runtime::build_teardown,
    },
};

use crate::common::fixture;

fn activation() -> Activation {
    Activation::new(
        RawParams {
            input: Some("a.trace".into()),
            target_frame: Some(5),
            ..RawParams::default()
        },
        Some(fixture("tests/fixtures/params_partial.json")),
    )
}

#[test]
fn configured_lifecycle_forwards_once_per_instance() -> Result<()> {
    let config = LauncherConfig::load_from_path(
        PathBuf::from(fixture("tests/fixtures/launcher_valid.toml")),
        true,
    )?;
    let teardown = build_teardown(&config.teardown);
    let target = ForwardTarget {
        target: config.downstream.target.clone(),
        key: config.downstream.key.clone(),
    };
    let mut lifecycle = Lifecycle::new(activation(), target, RecordingForwarder::new(), teardown);

    lifecycle.on_create()?;
    lifecycle.on_start()?;
    let first = lifecycle.on_resume()?;
    assert!(matches!(first, ResumeOutcome::Forwarded(_)));

    lifecycle.on_pause()?;
    let second = lifecycle.on_resume()?;
    assert_eq!(second, ResumeOutcome::AlreadyForwarded);
    assert_eq!(lifecycle.forwarder().requests().len(), 1);

    let request = &lifecycle.forwarder().requests()[0];
    assert_eq!(request.key, "fastforward");
    assert_eq!(
        request.args.as_str(),
        "--input a.trace --output b.trace --targetFrame 5 --noscreen \
--removeUnusedShader 1 --removeUnusedMipmap 1 --removeUnusedBuffer 0 \
--norestoreUnusedBuffer 1 --removeBufferSubData 1 "
    );

    lifecycle.on_pause()?;
    lifecycle.on_stop()?;
    lifecycle.on_destroy()?;
    assert_eq!(lifecycle.state(), LifecycleState::Destroyed);
    assert!(!lifecycle.teardown_pending());
    assert!(!lifecycle.has_forwarded());
    Ok(())
}

#[test]
fn recreated_instance_forwards_again() -> Result<()> {
    let section = TeardownSection {
        delay: Duration::ZERO,
        force_exit: false,
    };
    let teardown = build_teardown(&section);
    let mut forwarder = RecordingForwarder::new();
    {
        let mut lifecycle = Lifecycle::new(
            activation(),
            ForwardTarget::default(),
            &mut forwarder,
            teardown,
        );
        lifecycle.on_create()?;
        lifecycle.on_start()?;
        lifecycle.on_resume()?;
        lifecycle.on_pause()?;
        lifecycle.on_stop()?;
        lifecycle.on_destroy()?;

        lifecycle.on_create()?;
        lifecycle.on_start()?;
        assert!(matches!(lifecycle.on_resume()?, ResumeOutcome::Forwarded(_)));
    }
    assert_eq!(forwarder.requests().len(), 2);
    Ok(())
}
