//! 网络活动监视器
//!
//! 通过 CDP 的 Network 事件维护"进行中的请求"集合，用来判断网络是否空闲。

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::error::AppResult;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 请求状态
///
/// 响应事件和请求事件走不同的通道，读取响应体的一方可能先于这里看到请求。
/// 因此"已结束"只认显式记录的结束事件，没见过的请求一律视为未结束。
#[derive(Debug)]
struct NetworkState {
    in_flight: HashSet<String>,
    finished: HashSet<String>,
    last_activity: Instant,
}

impl NetworkState {
    fn new(now: Instant) -> Self {
        Self {
            in_flight: HashSet::new(),
            finished: HashSet::new(),
            last_activity: now,
        }
    }

    fn record_started(&mut self, id: String, now: Instant) {
        // 重定向会复用同一个请求 id
        self.finished.remove(&id);
        self.in_flight.insert(id);
        self.last_activity = now;
    }

    fn record_finished(&mut self, id: String, now: Instant) {
        self.in_flight.remove(&id);
        self.finished.insert(id);
        self.last_activity = now;
    }

    fn is_idle_for(&self, quiet: Duration, now: Instant) -> bool {
        self.in_flight.is_empty() && now.duration_since(self.last_activity) >= quiet
    }

    fn is_finished(&self, id: &str) -> bool {
        self.finished.contains(id)
    }

    fn forget(&mut self, id: &str) {
        self.finished.remove(id);
    }
}

enum Activity {
    Started(String),
    Finished(String),
}

/// 网络活动监视器
#[derive(Clone)]
pub struct NetworkMonitor {
    state: Arc<Mutex<NetworkState>>,
    task: Arc<JoinHandle<()>>,
}

impl NetworkMonitor {
    /// 在页面上挂载监视器
    pub async fn attach(page: &Page) -> AppResult<Self> {
        page.execute(EnableParams::default()).await?;

        let started = page
            .event_listener::<EventRequestWillBeSent>()
            .await?
            .map(|e| Activity::Started(e.request_id.inner().clone()))
            .boxed();
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await?
            .map(|e| Activity::Finished(e.request_id.inner().clone()))
            .boxed();
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await?
            .map(|e| Activity::Finished(e.request_id.inner().clone()))
            .boxed();

        let state = Arc::new(Mutex::new(NetworkState::new(Instant::now())));

        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            let mut events = futures::stream::select_all(vec![started, finished, failed]);
            while let Some(activity) = events.next().await {
                let Ok(mut state) = task_state.lock() else {
                    break;
                };
                let now = Instant::now();
                match activity {
                    Activity::Started(id) => state.record_started(id, now),
                    Activity::Finished(id) => state.record_finished(id, now),
                }
            }
            debug!("网络事件流已结束");
        });

        Ok(Self {
            state,
            task: Arc::new(task),
        })
    }

    /// 当前是否空闲了至少 `quiet` 时长
    pub fn is_idle_for(&self, quiet: Duration) -> bool {
        match self.state.lock() {
            Ok(state) => state.is_idle_for(quiet, Instant::now()),
            Err(_) => true,
        }
    }

    /// 指定请求是否已经收到结束（或失败）事件
    pub fn is_finished(&self, request_id: &str) -> bool {
        match self.state.lock() {
            Ok(state) => state.is_finished(request_id),
            Err(_) => true,
        }
    }

    /// 等待网络空闲，本身不设上限
    pub async fn wait_for_idle(&self, quiet: Duration) {
        while !self.is_idle_for(quiet) {
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 等待指定请求结束，最多等待 `limit`，返回是否等到
    pub async fn wait_for_request(&self, request_id: &str, limit: Duration) -> bool {
        let started = Instant::now();
        while !self.is_finished(request_id) {
            if started.elapsed() >= limit {
                return false;
            }
            sleep(POLL_INTERVAL).await;
        }
        true
    }

    /// 不再关心该请求，释放记录
    pub fn forget(&self, request_id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.forget(request_id);
        }
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(500);

    #[test]
    fn test_unknown_request_is_not_finished() {
        let state = NetworkState::new(Instant::now());
        assert!(!state.is_finished("1000.1"));
    }

    #[test]
    fn test_request_lifecycle() {
        let t0 = Instant::now();
        let mut state = NetworkState::new(t0);

        state.record_started("1000.1".to_string(), t0);
        assert!(!state.is_finished("1000.1"));
        assert!(!state.is_idle_for(QUIET, t0 + QUIET * 2));

        let t1 = t0 + Duration::from_millis(100);
        state.record_finished("1000.1".to_string(), t1);
        assert!(state.is_finished("1000.1"));

        state.forget("1000.1");
        assert!(!state.is_finished("1000.1"));
    }

    #[test]
    fn test_finish_seen_before_start_still_counts() {
        let t0 = Instant::now();
        let mut state = NetworkState::new(t0);

        state.record_finished("7.2".to_string(), t0);
        assert!(state.is_finished("7.2"));
        assert!(state.in_flight.is_empty());
    }

    #[test]
    fn test_redirect_reopens_request() {
        let t0 = Instant::now();
        let mut state = NetworkState::new(t0);

        state.record_started("9.1".to_string(), t0);
        state.record_finished("9.1".to_string(), t0);
        state.record_started("9.1".to_string(), t0);
        assert!(!state.is_finished("9.1"));
    }

    #[test]
    fn test_idle_needs_quiet_window() {
        let t0 = Instant::now();
        let mut state = NetworkState::new(t0);

        state.record_started("a".to_string(), t0);
        let t1 = t0 + Duration::from_millis(200);
        state.record_finished("a".to_string(), t1);

        assert!(!state.is_idle_for(QUIET, t1 + Duration::from_millis(499)));
        assert!(state.is_idle_for(QUIET, t1 + QUIET));
    }
}
