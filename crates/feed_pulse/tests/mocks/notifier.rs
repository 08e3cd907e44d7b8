use std::sync::{Arc, Mutex};
use feed_pulse::notify::{Notifier, NotifyError};

#[derive(Clone)]
pub struct MockNotifier {
    pub reachable: bool,
    pub fail_posts: bool,
    pub posted: Arc<Mutex<Vec<String>>>,
    pub reachability_checks: Arc<Mutex<usize>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self {
            reachable: true,
            fail_posts: false,
            posted: Arc::new(Mutex::new(Vec::new())),
            reachability_checks: Arc::new(Mutex::new(0)),
        }
    }
}

impl MockNotifier {
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_posts: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.posted.lock().unwrap().clone()
    }
}

impl Notifier for MockNotifier {
    async fn check_reachable(&self) -> bool {
        *self.reachability_checks.lock().unwrap() += 1;
        self.reachable
    }

    async fn post(&self, text: &str) -> Result<(), NotifyError> {
        self.posted.lock().unwrap().push(text.to_string());
        if self.fail_posts {
            return Err(NotifyError::Api {
                status: 400,
                message: "Bad Request: chat not found".to_string(),
            });
        }
        Ok(())
    }
}
