//! Background job behaviour on the tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use chunkwise_scheduler::*;
use tokio::sync::watch;

fn adaptive(pressure: &SharedPressure) -> ChunkScheduler {
    let config = SchedulerConfig {
        strategy: StrategyKind::Adaptive,
        ..SchedulerConfig::default()
    };
    ChunkScheduler::with_sources(config, Arc::new(SystemClock), Arc::new(pressure.clone()))
}

fn req(id: &str, priority: PriorityTier) -> LoadingRequest {
    LoadingRequest::with_id(id, ChunkCoord::default(), priority, 0.0)
}

#[tokio::test]
async fn test_cleanup_task_keeps_live_markers() {
    let scheduler = ChunkScheduler::new(SchedulerConfig::default());
    scheduler.schedule_load(req("queued", PriorityTier::Normal)).unwrap();
    assert!(scheduler.cancel_request("queued", None));
    assert!(scheduler.cancel_request("not-yet-admitted", None));

    let (tx, rx) = watch::channel(false);
    let handle = spawn_cleanup_task(scheduler.clone(), Duration::from_millis(10), rx);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Neither id has completed or failed, so both markers survive the sweeps.
    assert!(scheduler.is_cancelled("queued"));
    assert!(scheduler.is_cancelled("not-yet-admitted"));

    tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_rebalance_task_sheds_under_critical_pressure() {
    let pressure = SharedPressure::with_value(0.95);
    let scheduler = adaptive(&pressure);
    for i in 0..5 {
        scheduler.schedule_load(req(&format!("bg{}", i), PriorityTier::Background)).unwrap();
    }
    scheduler.schedule_load(req("crit", PriorityTier::Critical)).unwrap();

    let (tx, rx) = watch::channel(false);
    let handle = spawn_rebalance_task(scheduler.clone(), Duration::from_millis(10), rx);

    tokio::time::sleep(Duration::from_millis(60)).await;
    tx.send(true).unwrap();
    handle.await.unwrap();

    let stats = scheduler.get_queue_statistics();
    assert_eq!(stats.shed, 5);
    assert_eq!(stats.depth(PriorityTier::Background), 0);
    // At 0.95 the Critical admission was downgraded to High, which is never shed.
    assert_eq!(stats.depth(PriorityTier::High), 1);
}

#[tokio::test]
async fn test_background_jobs_shutdown() {
    let pressure = SharedPressure::new();
    let scheduler = adaptive(&pressure);
    let jobs = BackgroundJobs::spawn_with_intervals(
        &scheduler,
        Duration::from_millis(5),
        Duration::from_millis(5),
    );

    scheduler.schedule_load(req("low", PriorityTier::Low)).unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    // Pressure unavailable: nothing is shed.
    assert_eq!(scheduler.get_queue_statistics().depth(PriorityTier::Low), 1);

    tokio::time::timeout(Duration::from_secs(2), jobs.shutdown())
        .await
        .expect("background jobs did not stop");
}
