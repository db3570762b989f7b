//! `JobRegistry`: the dispatcher's index of running jobs by queue
//! (spec.md §4.I lifecycle hooks feed this). Kept separate from
//! `QueueTable` so queue state never holds a back-pointer to its jobs
//! (spec.md §9 design note on avoiding the QSI↔JobQueuesManager reference
//! cycle); the registry instead owns a job_id → queue side index for O(1)
//! lookup by id.

use std::collections::HashMap;

use crate::{ids::QueueName, traits::Job};

#[derive(Default)]
pub struct JobRegistry {
	by_queue: HashMap<QueueName, Vec<Box<dyn Job>>>,
	queue_of_job: HashMap<String, QueueName>,
}

impl JobRegistry {
	#[must_use]
	pub fn new() -> Self { Self::default() }

	/// spec.md §4.I `jobAdded`: files the job under its queue.
	pub fn add(&mut self, job: Box<dyn Job>) {
		let queue = job.queue_name().clone();
		self.queue_of_job.insert(job.id().to_owned(), queue.clone());
		self.by_queue.entry(queue).or_default().push(job);
	}

	/// spec.md §4.I `jobCompleted`/`jobRemoved`: drops the job and returns it
	/// so the caller can read its final user/queue before the QSI update.
	pub fn remove(&mut self, job_id: &str) -> Option<Box<dyn Job>> {
		let queue = self.queue_of_job.remove(job_id)?;
		let jobs = self.by_queue.get_mut(&queue)?;
		let position = jobs.iter().position(|job| job.id() == job_id)?;
		Some(jobs.remove(position))
	}

	#[must_use]
	pub fn jobs_in_queue(&self, queue: &QueueName) -> &[Box<dyn Job>] {
		self.by_queue.get(queue).map_or(&[], Vec::as_slice)
	}

	pub fn jobs_in_queue_mut(&mut self, queue: &QueueName) -> &mut [Box<dyn Job>] {
		self.by_queue.entry(queue.clone()).or_default().as_mut_slice()
	}

	pub fn find_job_mut(&mut self, job_id: &str) -> Option<&mut Box<dyn Job>> {
		let queue = self.queue_of_job.get(job_id)?;
		self.by_queue
			.get_mut(queue)?
			.iter_mut()
			.find(|job| job.id() == job_id)
	}

	/// All jobs across all queues, used by the per-heartbeat TSI rebuild
	/// (spec.md §4.G step 2) which walks every running job regardless of
	/// queue-walk order.
	pub fn all_jobs(&self) -> impl Iterator<Item = &Box<dyn Job>> { self.by_queue.values().flatten() }

	#[must_use]
	pub fn queue_of(&self, job_id: &str) -> Option<&QueueName> { self.queue_of_job.get(job_id) }
}
