//! The kernel: negotiation, route learning, and commit.
//!
//! ```text
//! raw bytes ── decode ──▶ Message
//!   └─▶ trie.resolve(parms)            candidates (one node's modules)
//!         └─▶ accept() each, in order  promising + learned routes
//!               └─▶ handle() each      first success wins
//!                     └─▶ NoHandler    nothing succeeded
//! ```
//!
//! A single dispatch runs its module calls one after another. Independent
//! dispatches run concurrently against the same `Kernel`; the trie and the
//! registration table sit behind `parking_lot` locks that are never held
//! across an `.await`.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

use super::error::{KernelError, Phase};
use super::trie::{same_module, Route, SyscallTrie};
use crate::modules::{Module, Parm};
use crate::promise::{decode, Message};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Bytes returned by the module that handled the request.
    pub output: Vec<u8>,
    /// Name of that module.
    pub handled_by: String,
    /// Number of candidates offered the request.
    pub candidates: usize,
    /// Number of candidates that accepted.
    pub promising: usize,
    /// Number of accepted modules whose `handle` failed before the winner.
    pub broken_promises: usize,
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

/// Message router between callers and modules.
pub struct Kernel {
    trie: RwLock<SyscallTrie>,
    registry: RwLock<Vec<Arc<dyn Module>>>,
    dispatch_timeout: Option<Duration>,
}

impl Kernel {
    /// Create a kernel with an empty trie and no dispatch timeout.
    pub fn new() -> Self {
        Self {
            trie: RwLock::new(SyscallTrie::new()),
            registry: RwLock::new(Vec::new()),
            dispatch_timeout: None,
        }
    }

    /// Apply `timeout` to dispatches that do not pass their own deadline.
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = Some(timeout);
        self
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout
    }

    // -- registration --------------------------------------------------------

    /// Bootstrap `module` at `path`.
    ///
    /// An empty path registers a catch-all at the root. Registering the
    /// same module instance at the same path twice is a no-op.
    pub fn register<S: AsRef<str>>(&self, path: &[S], module: Arc<dyn Module>) {
        {
            let mut registry = self.registry.write();
            if !registry.iter().any(|m| same_module(m, &module)) {
                registry.push(module.clone());
            }
        }
        let name = module.name().to_string();
        let added = self.trie.write().add_route(path, module);
        log::debug!(
            "Registered module '{}' at [{}] (new: {})",
            name,
            join_path(path),
            added
        );
    }

    /// Registered modules, in registration order.
    pub fn modules(&self) -> Vec<Arc<dyn Module>> {
        self.registry.read().clone()
    }

    /// First registered module called `name`.
    pub fn module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.registry.read().iter().find(|m| m.name() == name).cloned()
    }

    /// Every populated trie path, registered and learned.
    pub fn routes(&self) -> Vec<Route> {
        self.trie.read().routes()
    }

    /// Modules that would be offered a request with these parameters.
    pub fn candidates(&self, parms: &[Parm]) -> Vec<Arc<dyn Module>> {
        let tokens = tokens(parms);
        self.trie.read().resolve(&tokens).modules().to_vec()
    }

    // -- dispatch ------------------------------------------------------------

    /// Decode `raw` and dispatch it under the default timeout.
    pub async fn dispatch(&self, raw: &[u8]) -> Result<Vec<u8>, KernelError> {
        let outcome = self.dispatch_raw(raw, self.default_deadline()).await?;
        Ok(outcome.output)
    }

    /// Decode `raw` and dispatch it, giving up at `deadline`.
    pub async fn dispatch_with_deadline(
        &self,
        raw: &[u8],
        deadline: Instant,
    ) -> Result<Vec<u8>, KernelError> {
        let outcome = self.dispatch_raw(raw, Some(deadline)).await?;
        Ok(outcome.output)
    }

    /// Dispatch a decoded message under the default timeout.
    ///
    /// Wire parameters are offered to modules as [`Parm::Text`].
    pub async fn dispatch_message(&self, message: &Message) -> Result<Outcome, KernelError> {
        self.route_message(message, self.default_deadline()).await
    }

    /// Dispatch an in-process request under the default timeout.
    pub async fn call(
        &self,
        parms: &[Parm],
        payload: Option<&[u8]>,
    ) -> Result<Outcome, KernelError> {
        self.route(parms, payload, self.default_deadline()).await
    }

    /// Dispatch an in-process request, giving up at `deadline`.
    pub async fn call_with_deadline(
        &self,
        parms: &[Parm],
        payload: Option<&[u8]>,
        deadline: Instant,
    ) -> Result<Outcome, KernelError> {
        self.route(parms, payload, Some(deadline)).await
    }

    async fn dispatch_raw(
        &self,
        raw: &[u8],
        deadline: Option<Instant>,
    ) -> Result<Outcome, KernelError> {
        let message = decode(raw)?;
        self.route_message(&message, deadline).await
    }

    async fn route_message(
        &self,
        message: &Message,
        deadline: Option<Instant>,
    ) -> Result<Outcome, KernelError> {
        let parms = Parm::from_wire(message.parms());
        self.route(&parms, message.payload(), deadline).await
    }

    fn default_deadline(&self) -> Option<Instant> {
        self.dispatch_timeout.map(|t| Instant::now() + t)
    }

    async fn route(
        &self,
        parms: &[Parm],
        payload: Option<&[u8]>,
        deadline: Option<Instant>,
    ) -> Result<Outcome, KernelError> {
        let tokens = tokens(parms);
        let path = join_path(&tokens);

        // Matched: snapshot one node's modules, then release the lock.
        let candidates: Vec<Arc<dyn Module>> =
            self.trie.read().resolve(&tokens).modules().to_vec();
        log::debug!(
            "Dispatch [{}]: {} candidate(s)",
            path,
            candidates.len()
        );

        // Negotiating
        let mut promising = Vec::with_capacity(candidates.len());
        for module in &candidates {
            let answer = within(deadline, Phase::Negotiating, module.accept(parms)).await?;
            match answer {
                Ok(acceptance) if acceptance.will_handle => {
                    if self.trie.write().add_route(&tokens, module.clone()) {
                        log::debug!("Learned route [{}] -> '{}'", path, module.name());
                    }
                    promising.push(module.clone());
                }
                Ok(_) => {
                    log::debug!("Module '{}' declined [{}]", module.name(), path);
                }
                Err(e) => {
                    log::warn!(
                        "Module '{}' failed to answer accept for [{}]: {}",
                        module.name(),
                        path,
                        e
                    );
                }
            }
        }

        // Committing
        let mut broken_promises = 0;
        for module in &promising {
            match within(deadline, Phase::Committing, module.handle(parms, payload)).await? {
                Ok(output) => {
                    let outcome = Outcome {
                        output,
                        handled_by: module.name().to_string(),
                        candidates: candidates.len(),
                        promising: promising.len(),
                        broken_promises,
                    };
                    log::debug!(
                        "Dispatch [{}] handled by '{}' ({} candidate(s), {} promising, {} broken)",
                        path,
                        outcome.handled_by,
                        outcome.candidates,
                        outcome.promising,
                        outcome.broken_promises
                    );
                    return Ok(outcome);
                }
                Err(e) => {
                    broken_promises += 1;
                    log::warn!(
                        "Broken promise: module '{}' accepted [{}] but failed: {}",
                        module.name(),
                        path,
                        e
                    );
                }
            }
        }

        log::debug!(
            "No handler for [{}] ({} candidate(s), {} promising)",
            path,
            candidates.len(),
            promising.len()
        );
        Err(KernelError::NoHandler { path })
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("modules", &self.registry.read().len())
            .field("nodes", &self.trie.read().node_count())
            .field("dispatch_timeout", &self.dispatch_timeout)
            .finish()
    }
}

/// Run one module call, bounded by `deadline` if there is one.
///
/// An already expired deadline fails before `fut` is polled at all.
async fn within<F: Future>(
    deadline: Option<Instant>,
    phase: Phase,
    fut: F,
) -> Result<F::Output, KernelError> {
    let Some(deadline) = deadline else {
        return Ok(fut.await);
    };
    if Instant::now() >= deadline {
        return Err(KernelError::Timeout { phase });
    }
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| KernelError::Timeout { phase })
}

fn tokens(parms: &[Parm]) -> Vec<Cow<'_, str>> {
    parms.iter().map(Parm::token).collect()
}

fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::modules::{Acceptance, CacheModule, ModuleError};
    use crate::promise::{encode, HashAlgorithm, Promise};
    use crate::store::MemoryStore;

    #[derive(Clone, Copy)]
    enum Answer {
        Yes,
        No,
        Fail,
    }

    /// Module with scripted answers that counts its calls.
    struct Scripted {
        name: &'static str,
        answer: Answer,
        result: Result<&'static [u8], &'static str>,
        delay: Option<Duration>,
        delay_accept: bool,
        accepts: AtomicUsize,
        handles: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, answer: Answer, result: Result<&'static [u8], &'static str>) -> Self {
            Self {
                name,
                answer,
                result,
                delay: None,
                delay_accept: false,
                accepts: AtomicUsize::new(0),
                handles: AtomicUsize::new(0),
            }
        }

        fn ok(name: &'static str, out: &'static [u8]) -> Arc<Self> {
            Arc::new(Self::new(name, Answer::Yes, Ok(out)))
        }

        fn slow_accept(name: &'static str, delay: Duration) -> Arc<Self> {
            let mut m = Self::new(name, Answer::Yes, Ok(b"late"));
            m.delay = Some(delay);
            m.delay_accept = true;
            Arc::new(m)
        }

        fn slow_handle(name: &'static str, delay: Duration) -> Arc<Self> {
            let mut m = Self::new(name, Answer::Yes, Ok(b"late"));
            m.delay = Some(delay);
            Arc::new(m)
        }

        fn accepts(&self) -> usize {
            self.accepts.load(Ordering::SeqCst)
        }

        fn handles(&self) -> usize {
            self.handles.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Module for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn accept(&self, _parms: &[Parm]) -> Result<Acceptance, ModuleError> {
            self.accepts.fetch_add(1, Ordering::SeqCst);
            if let (Some(d), true) = (self.delay, self.delay_accept) {
                tokio::time::sleep(d).await;
            }
            match self.answer {
                Answer::Yes => Ok(Acceptance::accept(Value::Null)),
                Answer::No => Ok(Acceptance::decline(Value::Null)),
                Answer::Fail => Err(ModuleError::Accept("scripted".into())),
            }
        }

        async fn handle(&self, _parms: &[Parm], _payload: Option<&[u8]>) -> Result<Vec<u8>, ModuleError> {
            self.handles.fetch_add(1, Ordering::SeqCst);
            if let (Some(d), false) = (self.delay, self.delay_accept) {
                tokio::time::sleep(d).await;
            }
            self.result
                .map(|b| b.to_vec())
                .map_err(|e| ModuleError::HandleFailed(e.to_string()))
        }
    }

    fn parms(tokens: &[&str]) -> Vec<Parm> {
        tokens.iter().map(|t| Parm::from(*t)).collect()
    }

    const ROOT: &[&str] = &[];

    #[tokio::test]
    async fn test_first_promising_module_wins() {
        let kernel = Kernel::new();
        let a = Scripted::ok("a", b"from a");
        let b = Scripted::ok("b", b"from b");
        kernel.register(ROOT, a.clone());
        kernel.register(ROOT, b.clone());

        let outcome = kernel.call(&parms(&["x"]), None).await.unwrap();
        assert_eq!(outcome.output, b"from a");
        assert_eq!(outcome.handled_by, "a");
        assert_eq!(outcome.candidates, 2);
        assert_eq!(outcome.promising, 2);
        assert_eq!(outcome.broken_promises, 0);

        assert_eq!((a.accepts(), a.handles()), (1, 1));
        assert_eq!((b.accepts(), b.handles()), (1, 0));
    }

    #[tokio::test]
    async fn test_broken_promise_falls_through() {
        let kernel = Kernel::new();
        let a = Arc::new(Scripted::new("a", Answer::Yes, Err("disk on fire")));
        let b = Scripted::ok("b", b"from b");
        kernel.register(ROOT, a.clone());
        kernel.register(ROOT, b.clone());

        let outcome = kernel.call(&parms(&["x"]), None).await.unwrap();
        assert_eq!(outcome.output, b"from b");
        assert_eq!(outcome.broken_promises, 1);
        assert_eq!(a.handles(), 1);
        assert_eq!(b.handles(), 1);
    }

    #[tokio::test]
    async fn test_decliners_and_accept_errors_are_skipped() {
        let kernel = Kernel::new();
        let no = Arc::new(Scripted::new("no", Answer::No, Ok(b"never")));
        let err = Arc::new(Scripted::new("err", Answer::Fail, Ok(b"never")));
        let yes = Scripted::ok("yes", b"ok");
        kernel.register(ROOT, no.clone());
        kernel.register(ROOT, err.clone());
        kernel.register(ROOT, yes.clone());

        let outcome = kernel.call(&parms(&["x"]), None).await.unwrap();
        assert_eq!(outcome.handled_by, "yes");
        assert_eq!(outcome.promising, 1);
        assert_eq!(no.handles() + err.handles(), 0);
    }

    #[tokio::test]
    async fn test_no_handler() {
        let empty = Kernel::new();
        let err = empty.call(&parms(&["x", "y"]), None).await.unwrap_err();
        assert!(matches!(err, KernelError::NoHandler { ref path } if path == "x y"));

        let kernel = Kernel::new();
        kernel.register(ROOT, Arc::new(Scripted::new("no", Answer::No, Ok(b""))));
        kernel.register(ROOT, Arc::new(Scripted::new("broken", Answer::Yes, Err("nope"))));
        let err = kernel.call(&parms(&["x"]), None).await.unwrap_err();
        assert!(matches!(err, KernelError::NoHandler { .. }));
    }

    #[tokio::test]
    async fn test_route_learning() {
        let kernel = Kernel::new();
        let a = Scripted::ok("a", b"a");
        let no = Arc::new(Scripted::new("no", Answer::No, Ok(b"")));
        kernel.register(ROOT, a.clone());
        kernel.register(ROOT, no.clone());

        kernel.call(&parms(&["x", "y"]), None).await.unwrap();
        kernel.call(&parms(&["x", "y"]), None).await.unwrap();

        let learned: Vec<Route> = kernel
            .routes()
            .into_iter()
            .filter(|r| !r.path.is_empty())
            .collect();
        assert_eq!(
            learned,
            vec![Route {
                path: vec!["x".into(), "y".into()],
                modules: vec!["a".into()],
            }]
        );
        // The learned node now narrows candidates to the module that accepted.
        let candidates = kernel.candidates(&parms(&["x", "y", "z"]));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name(), "a");
    }

    #[tokio::test]
    async fn test_learned_route_does_not_shadow_catch_all_for_siblings() {
        let kernel = Kernel::new();
        let catch_all = Scripted::ok("catch-all", b"root");
        kernel.register(ROOT, catch_all.clone());

        kernel.call(&parms(&["a", "b", "c"]), None).await.unwrap();
        let outcome = kernel.call(&parms(&["a", "b", "d"]), None).await.unwrap();
        assert_eq!(outcome.handled_by, "catch-all");
        assert_eq!(catch_all.accepts(), 2);
    }

    #[tokio::test]
    async fn test_ancestor_modules_are_not_candidates() {
        let kernel = Kernel::new();
        let root = Scripted::ok("root", b"root");
        let svc = Arc::new(Scripted::new("svc", Answer::No, Ok(b"")));
        kernel.register(ROOT, root.clone());
        kernel.register(&["svc"], svc.clone());

        let err = kernel.call(&parms(&["svc", "op"]), None).await.unwrap_err();
        assert!(matches!(err, KernelError::NoHandler { .. }));
        assert_eq!(root.accepts(), 0);
        assert_eq!(svc.accepts(), 1);
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let kernel = Kernel::new();
        let a: Arc<dyn Module> = Scripted::ok("a", b"a");
        kernel.register(ROOT, a.clone());
        kernel.register(ROOT, a.clone());
        kernel.register(&["p"], a);

        assert_eq!(kernel.modules().len(), 1);
        assert_eq!(kernel.candidates(&[]).len(), 1);
        assert!(kernel.module("a").is_some());
        assert!(kernel.module("b").is_none());
    }

    #[tokio::test]
    async fn test_timeout_during_negotiation() {
        let kernel = Kernel::new();
        let slow = Scripted::slow_accept("slow", Duration::from_secs(5));
        kernel.register(ROOT, slow.clone());

        let deadline = Instant::now() + Duration::from_millis(50);
        let err = kernel
            .call_with_deadline(&parms(&["x"]), None, deadline)
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::Timeout { phase: Phase::Negotiating }));
        assert_eq!(slow.handles(), 0);
    }

    #[tokio::test]
    async fn test_timeout_during_commit_keeps_learned_route() {
        let kernel = Kernel::new();
        let slow = Scripted::slow_handle("slow", Duration::from_secs(5));
        kernel.register(ROOT, slow.clone());

        let deadline = Instant::now() + Duration::from_millis(50);
        let err = kernel
            .call_with_deadline(&parms(&["x"]), None, deadline)
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::Timeout { phase: Phase::Committing }));
        assert!(kernel
            .routes()
            .iter()
            .any(|r| r.path == vec!["x".to_string()]));
    }

    #[tokio::test]
    async fn test_expired_deadline_invokes_nothing() {
        let kernel = Kernel::new();
        let a = Scripted::ok("a", b"a");
        kernel.register(ROOT, a.clone());

        let err = kernel
            .call_with_deadline(&parms(&["x"]), None, Instant::now())
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::Timeout { .. }));
        assert_eq!(a.accepts(), 0);
    }

    #[tokio::test]
    async fn test_default_timeout_applies_to_dispatch() {
        let kernel = Kernel::new().with_dispatch_timeout(Duration::from_millis(50));
        kernel.register(ROOT, Scripted::slow_handle("slow", Duration::from_secs(5)));

        let msg = Message::new("I will be slow", "sha256", vec!["x".into()], None).unwrap();
        let raw = encode(&msg).unwrap();
        let err = kernel.dispatch(&raw).await.unwrap_err();
        assert!(matches!(err, KernelError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_with_deadline_shares_the_wire_path() {
        let kernel = Kernel::new().with_dispatch_timeout(Duration::from_millis(1));
        let a = Scripted::ok("a", b"from a");
        kernel.register(ROOT, a.clone());

        let msg = Message::new("I will answer", "sha256", vec!["x".into()], None).unwrap();
        let raw = encode(&msg).unwrap();

        // An explicit deadline overrides the kernel default.
        let far = Instant::now() + Duration::from_secs(5);
        assert_eq!(kernel.dispatch_with_deadline(&raw, far).await.unwrap(), b"from a");

        let err = kernel
            .dispatch_with_deadline(&raw, Instant::now())
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::Timeout { phase: Phase::Negotiating }));

        let err = kernel.dispatch_with_deadline(b"%%%", far).await.unwrap_err();
        assert!(matches!(err, KernelError::Codec(_)));
        assert_eq!(a.accepts(), 1);
    }

    #[tokio::test]
    async fn test_byte_and_hex_text_parms_share_a_route() {
        let kernel = Kernel::new();
        let a = Scripted::ok("a", b"a");
        kernel.register(ROOT, a.clone());

        kernel.call(&[Parm::Bytes(vec![0xab])], None).await.unwrap();
        let learned: Vec<Vec<String>> = kernel.routes().into_iter().map(|r| r.path).collect();
        assert_eq!(learned, vec![vec![], vec!["ab".to_string()]]);

        let via_text = kernel.candidates(&[Parm::from("ab")]);
        let via_bytes = kernel.candidates(&[Parm::Bytes(vec![0xab])]);
        assert_eq!(via_text.len(), 1);
        assert!(same_module(&via_text[0], &via_bytes[0]));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_malformed_bytes() {
        let kernel = Kernel::new();
        let err = kernel.dispatch(b"not-a-promise x y").await.unwrap_err();
        assert!(matches!(err, KernelError::Codec(_)));
    }

    #[tokio::test]
    async fn test_hello_message_without_cache_arguments() {
        let kernel = Kernel::new();
        kernel.register(ROOT, Arc::new(CacheModule::new(Arc::new(MemoryStore::new()))));

        let msg = Message::new(
            "I will say hello",
            "sha256",
            vec!["hello".into()],
            Some(b"world".to_vec()),
        )
        .unwrap();
        let err = kernel.dispatch(&encode(&msg).unwrap()).await.unwrap_err();
        assert!(matches!(err, KernelError::NoHandler { .. }));
    }

    #[tokio::test]
    async fn test_cache_round_trip_over_the_wire() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(CacheModule::new(store.clone()));
        let kernel = Kernel::new();
        kernel.register(ROOT, cache.clone());

        let promise = Promise::derive("I will remember greetings", HashAlgorithm::Sha2_256);
        let wire_parms = vec![
            promise.to_text(),
            cache.module_id().to_text(),
            "greeting".to_string(),
        ];

        let put = Message::new(
            "I will store a greeting",
            "sha256",
            wire_parms.clone(),
            Some(b"hello world".to_vec()),
        )
        .unwrap();
        assert_eq!(kernel.dispatch(&encode(&put).unwrap()).await.unwrap(), b"hello world");

        let get = Message::new("I will fetch a greeting", "blake3", wire_parms, None).unwrap();
        assert_eq!(kernel.dispatch(&encode(&get).unwrap()).await.unwrap(), b"hello world");

        let key = format!(
            "{}/{}/greeting",
            hex::encode(promise.to_multihash()),
            hex::encode(cache.module_id().to_multihash())
        );
        assert_eq!(store.keys(), vec![key]);
    }

    #[tokio::test]
    async fn test_cache_miss_is_no_handler() {
        let kernel = Kernel::new();
        let cache = Arc::new(CacheModule::new(Arc::new(MemoryStore::new())));
        kernel.register(ROOT, cache.clone());

        let p = Promise::derive("nothing here", HashAlgorithm::Sha2_256);
        let err = kernel
            .call(&[Parm::from(&p), Parm::from(&cache.module_id())], None)
            .await
            .unwrap_err();
        assert!(matches!(err, KernelError::NoHandler { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dispatch_learns_each_route_once() {
        let kernel = Arc::new(Kernel::new());
        let a = Scripted::ok("a", b"a");
        kernel.register(ROOT, a.clone());

        let tasks = (0..64).map(|i| {
            let kernel = kernel.clone();
            tokio::spawn(async move {
                let path = vec![Parm::from(format!("p{}", i % 8)), Parm::from("op")];
                kernel.call(&path, None).await.map(|o| o.output)
            })
        });
        for result in futures::future::join_all(tasks).await {
            assert_eq!(result.unwrap().unwrap(), b"a");
        }

        let routes = kernel.routes();
        // root + 8 learned paths, each holding the module exactly once
        assert_eq!(routes.len(), 9);
        for route in routes {
            assert_eq!(route.modules, vec!["a".to_string()]);
        }
        assert_eq!(a.handles(), 64);
    }
}
