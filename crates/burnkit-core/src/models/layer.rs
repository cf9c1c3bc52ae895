//! Layers group jobs and map 1:1 to a container in the host document.

use super::job::{Job, JobKind};
use serde::{Deserialize, Serialize};

/// An ordered list of jobs plus visibility and a display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Identifier of the document container.
    pub id: String,
    pub label: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

fn default_visible() -> bool {
    true
}

impl Layer {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            visible: true,
            jobs: Vec::new(),
        }
    }

    /// Append a new job with defaults for `kind` and return it.
    pub fn add_job(&mut self, kind: JobKind) -> &mut Job {
        let index = self.jobs.len();
        self.jobs.push(Job::create_default(kind));
        &mut self.jobs[index]
    }

    /// Remove the job at `index`. Out-of-range indices are ignored.
    pub fn remove_job(&mut self, index: usize) -> Option<Job> {
        (index < self.jobs.len()).then(|| self.jobs.remove(index))
    }

    /// Swap the job at `index` with the one before it.
    pub fn move_job_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.jobs.len() {
            return false;
        }
        self.jobs.swap(index, index - 1);
        true
    }

    /// Swap the job at `index` with the one after it.
    pub fn move_job_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.jobs.len() {
            return false;
        }
        self.jobs.swap(index, index + 1);
        true
    }

    /// Active jobs in defined order.
    pub fn active_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|job| job.active)
    }

    pub fn summary(&self) -> String {
        if self.jobs.is_empty() {
            return "No jobs".to_string();
        }
        format!(
            "{} job(s), {} active",
            self.jobs.len(),
            self.active_jobs().count()
        )
    }
}
