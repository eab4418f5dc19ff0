//! 测试用的脚本化会话
//!
//! 每次点击提交时取出下一条脚本，模拟页码指示器和每页一个结果响应。

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use directory_harvest::error::{AppError, AppResult};
use directory_harvest::infrastructure::{ObservedResponse, ResponseStream, Session, SessionProvider};
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;

pub const RESULT_URL: &str =
    "https://my.msstate.edu/web/home?p_p_id=MSUDirectory1612_WAR_directory1612&p_p_lifecycle=2";
pub const ASSET_URL: &str = "https://my.msstate.edu/static/portal.js";

/// 会话上发生的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Fill(String, String),
    Select(String, String),
    Click(String),
    LoadPage(u32),
    Close,
}

/// 一次提交对应的结果页
#[derive(Debug, Clone, Default)]
pub struct SubmitScript {
    /// 页码指示器内容，None 表示没有指示器
    pub indicator: Option<String>,
    /// 这些页返回无法解码的内容
    pub broken_pages: Vec<u32>,
}

impl SubmitScript {
    pub fn pages(n: u32) -> Self {
        Self {
            indicator: (n > 1).then(|| {
                (1..=n)
                    .map(|i| format!("<a href=\"javascript:getDetails({i})\">{i}</a>"))
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
            broken_pages: Vec::new(),
        }
    }

    pub fn indicator(text: &str) -> Self {
        Self {
            indicator: Some(text.to_string()),
            broken_pages: Vec::new(),
        }
    }
}

#[derive(Default)]
struct State {
    actions: Vec<Action>,
    scripts: VecDeque<SubmitScript>,
    current: Option<SubmitScript>,
    submissions: usize,
    sender: Option<UnboundedSender<ObservedResponse>>,
}

/// 脚本化会话
#[derive(Default)]
pub struct ScriptedSession {
    state: Mutex<State>,
    /// 永远不会出现的元素
    missing: HashSet<String>,
}

impl ScriptedSession {
    pub fn new(scripts: Vec<SubmitScript>) -> Arc<Self> {
        Self::with_missing(scripts, &[])
    }

    pub fn with_missing(scripts: Vec<SubmitScript>, missing: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                scripts: scripts.into(),
                ..Default::default()
            }),
            missing: missing.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn loaded_pages(&self) -> Vec<u32> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::LoadPage(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.actions().contains(&Action::Close)
    }

    fn record(&self, action: Action) {
        self.state.lock().unwrap().actions.push(action);
    }

    /// 模拟第 `page` 页的网络响应：一个无关资源 + 一个结果
    fn emit_page(&self, page: u32) {
        let state = self.state.lock().unwrap();
        let submission = state.submissions;
        let broken = state
            .current
            .as_ref()
            .map(|s| s.broken_pages.contains(&page))
            .unwrap_or(false);

        if let Some(sender) = &state.sender {
            let _ = sender.unbounded_send(ObservedResponse::ready(ASSET_URL, "console.log(1)"));
            let body = if broken {
                "<result><row>".to_string()
            } else {
                format!("<result query=\"{submission}\"><page>{page}</page></result>")
            };
            let _ = sender.unbounded_send(ObservedResponse::ready(RESULT_URL, body));
        }
    }
}

fn not_found(what: &str) -> AppError {
    AppError::session_failed(
        what.to_string(),
        std::io::Error::new(std::io::ErrorKind::NotFound, "scripted"),
    )
}

#[async_trait]
impl Session for ScriptedSession {
    async fn responses(&self) -> AppResult<ResponseStream> {
        let (tx, rx) = unbounded();
        self.state.lock().unwrap().sender = Some(tx);
        Ok(rx.boxed())
    }

    async fn wait_for_selector(&self, selector: &str) -> AppResult<()> {
        if self.missing.contains(selector) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn fill_text(&self, selector: &str, text: &str) -> AppResult<()> {
        self.record(Action::Fill(selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> AppResult<()> {
        self.record(Action::Select(selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> AppResult<()> {
        self.record(Action::Click(selector.to_string()));
        {
            let mut state = self.state.lock().unwrap();
            let next = state.scripts.pop_front();
            state.current = Some(next.ok_or_else(|| not_found("提交脚本"))?);
            state.submissions += 1;
        }
        self.emit_page(1);
        Ok(())
    }

    async fn inner_text(&self, _selector: &str) -> AppResult<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.current.as_ref().and_then(|s| s.indicator.clone()))
    }

    async fn load_page(&self, page: u32) -> AppResult<()> {
        self.record(Action::LoadPage(page));
        self.emit_page(page);
        Ok(())
    }

    async fn wait_for_network_idle(&self, _quiet: Duration) -> AppResult<()> {
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        self.record(Action::Close);
        self.state.lock().unwrap().sender = None;
        Ok(())
    }
}

/// 共享同一个脚本化会话的包装，方便测试结束后检查
pub struct SharedSession(pub Arc<ScriptedSession>);

#[async_trait]
impl Session for SharedSession {
    async fn responses(&self) -> AppResult<ResponseStream> {
        self.0.responses().await
    }
    async fn wait_for_selector(&self, selector: &str) -> AppResult<()> {
        self.0.wait_for_selector(selector).await
    }
    async fn fill_text(&self, selector: &str, text: &str) -> AppResult<()> {
        self.0.fill_text(selector, text).await
    }
    async fn select_option(&self, selector: &str, value: &str) -> AppResult<()> {
        self.0.select_option(selector, value).await
    }
    async fn click(&self, selector: &str) -> AppResult<()> {
        self.0.click(selector).await
    }
    async fn inner_text(&self, selector: &str) -> AppResult<Option<String>> {
        self.0.inner_text(selector).await
    }
    async fn load_page(&self, page: u32) -> AppResult<()> {
        self.0.load_page(page).await
    }
    async fn wait_for_network_idle(&self, quiet: Duration) -> AppResult<()> {
        self.0.wait_for_network_idle(quiet).await
    }
    async fn close(&self) -> AppResult<()> {
        self.0.close().await
    }
}

/// 每次 open 都返回同一个脚本化会话
pub struct ScriptedProvider {
    session: Arc<ScriptedSession>,
    opened: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    /// 返回提供者和打开次数计数器
    pub fn new(session: Arc<ScriptedSession>) -> (Self, Arc<AtomicUsize>) {
        let opened = Arc::new(AtomicUsize::new(0));
        let provider = Self {
            session,
            opened: Arc::clone(&opened),
        };
        (provider, opened)
    }
}

#[async_trait]
impl SessionProvider for ScriptedProvider {
    async fn open(&self) -> AppResult<Box<dyn Session>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SharedSession(Arc::clone(&self.session))))
    }
}
