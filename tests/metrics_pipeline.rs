use std::sync::Arc;
use std::time::Duration;
use vmpulse::application::poller::Poller;
use vmpulse::application::registration::{PluginOptions, build_catalog};
use vmpulse::infrastructure::observability::{MetricsReporter, ReportFormat, SampleExporter};
use vmpulse::infrastructure::{ChannelEmitter, StaticStatSource};

#[tokio::test(start_paused = true)]
async fn test_samples_flow_from_poller_to_gauges() {
    let options = PluginOptions::default().with_poll_rate(1000);
    let catalog = Arc::new(build_catalog(&options).unwrap());

    let (emitter, rx) = ChannelEmitter::channel(256);
    let exporter = SampleExporter::new(&catalog).unwrap();
    let reporter = MetricsReporter::new(rx, exporter.clone(), 60, ReportFormat::Prometheus);
    let reporter_task = tokio::spawn(reporter.run());

    let handle = Poller::new(
        catalog,
        Arc::new(StaticStatSource::healthy()),
        Arc::new(emitter),
    )
    .start()
    .await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.shutdown().await;

    // Every sender is gone once the poller stops, so the reporter drains and exits
    reporter_task.await.unwrap();

    let snapshot = exporter.snapshot();
    assert_eq!(snapshot.get("vmpulse_vm_memory_allocated_bytes"), Some(&1000.0));
    assert_eq!(
        snapshot.get("vmpulse_vm_stats_run_queue_count{type=\"dirty\"}"),
        Some(&1.0)
    );
    assert_eq!(
        snapshot.get("vmpulse_vm_system_process_limit_info"),
        Some(&262144.0)
    );

    // 4 one-shot samples, then 11 internal and 6 memory samples for the single tick
    assert_eq!(exporter.samples_applied(), 21);
    assert!(exporter.render().contains("vmpulse_vm_memory_allocated_bytes 1000"));
}

#[tokio::test(start_paused = true)]
async fn test_full_channel_drops_instead_of_blocking() {
    let catalog = Arc::new(build_catalog(&PluginOptions::default()).unwrap());
    let (emitter, _rx) = ChannelEmitter::channel(2);
    let emitter = Arc::new(emitter);

    let handle = Poller::new(
        catalog,
        Arc::new(StaticStatSource::healthy()),
        emitter.clone(),
    )
    .start()
    .await;

    assert_eq!(handle.manual_samples(), 4);
    assert_eq!(emitter.dropped(), 2);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_custom_prefix_reaches_exported_names() {
    let options =
        PluginOptions::from_toml_str("poll_rate = 500\nmetric_prefix = \"edge\"").unwrap();
    let catalog = Arc::new(build_catalog(&options).unwrap());

    let (emitter, rx) = ChannelEmitter::channel(64);
    let exporter = SampleExporter::new(&catalog).unwrap();
    let reporter = MetricsReporter::new(rx, exporter.clone(), 60, ReportFormat::Json);
    let reporter_task = tokio::spawn(reporter.run());

    let handle = Poller::new(
        catalog,
        Arc::new(StaticStatSource::healthy()),
        Arc::new(emitter),
    )
    .start()
    .await;
    handle.shutdown().await;
    reporter_task.await.unwrap();

    assert_eq!(
        exporter.snapshot().get("edge_system_process_limit_info"),
        Some(&262144.0)
    );
}
