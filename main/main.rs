mod args;
mod config;
mod sim;

use capsched_core::Result;
use capsched_scheduler::CapacityScheduler;
use rand::thread_rng;
use sim::{run_heartbeats, seed_jobs, SimCluster, SimWorker};
use tracing::info;

#[tokio::main]
async fn main() -> Result {
	capsched_core::log::init();

	let args = args::parse();
	let config = config::load(&args)?;

	let scheduler = CapacityScheduler::new(false);
	scheduler.start(&config).await?;
	info!(queues = config.queues.len(), "scheduler started");

	let queue_names = scheduler.queue_names().await;
	let mut cluster = SimCluster {
		workers: (0..args.workers)
			.map(|i| SimWorker::new(format!("worker-{i}"), args.slots_per_worker, args.slots_per_worker))
			.collect(),
	};

	let mut rng = thread_rng();
	seed_jobs(&scheduler, &queue_names, &mut rng).await;

	let dispatched = run_heartbeats(&scheduler, &mut cluster, args.heartbeats).await;

	for name in &queue_names {
		if let Some(report) = scheduler.queue_report(name).await {
			println!("{report}");
			println!("  Dispatched this run: {}", dispatched.get(name.as_str()).copied().unwrap_or(0));
		}
	}

	scheduler.terminate();
	Ok(())
}
