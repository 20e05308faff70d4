use crate::config::{Account, Config};
use crate::debug_if_enabled;
use crate::error::Result;
use crate::models::{AccountStatus, LaunchOutcome, RunState, SkipReason, WindowHandle};
use crate::services::process_launcher::{ProcessHandle, ProcessLauncher};
use crate::services::window_manager::WindowManager;
use crate::services::window_tracker::WindowTracker;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Результат поиска окна для одного аккаунта
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discovery {
    Found(WindowHandle),
    TimedOut,
    Cancelled,
}

/// Запускает клиенты для всех аккаунтов, сопоставляет им новые окна,
/// выполняет вход и расставляет окна.
///
/// Аккаунты обрабатываются строго в порядке конфигурации, и при запуске, и при
/// поиске окон. Ни одна ошибка отдельного аккаунта не прерывает запуск;
/// завершить его может только отмена `cancel`.
pub struct LaunchOrchestrator {
    config: Arc<Config>,
    launcher: Arc<dyn ProcessLauncher>,
    windows: Arc<dyn WindowManager>,
    cancel: CancellationToken,
    state: RunState,
    statuses: Vec<AccountStatus>,
    processes: Vec<ProcessHandle>,
    tracker: WindowTracker,
}

impl LaunchOrchestrator {
    pub fn new(
        config: Arc<Config>,
        launcher: Arc<dyn ProcessLauncher>,
        windows: Arc<dyn WindowManager>,
        cancel: CancellationToken,
    ) -> Self {
        info!("Инициализация LaunchOrchestrator ({} аккаунтов)", config.accounts.len());

        let statuses = vec![AccountStatus::Pending; config.accounts.len()];
        Self {
            config,
            launcher,
            windows,
            cancel,
            state: RunState::Idle,
            statuses,
            processes: Vec::new(),
            tracker: WindowTracker::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn statuses(&self) -> &[AccountStatus] {
        &self.statuses
    }

    #[cfg(test)]
    pub(crate) fn claimed_windows(&self) -> &std::collections::HashSet<WindowHandle> {
        self.tracker.claimed()
    }

    #[cfg(test)]
    pub(crate) fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// Полный цикл: запуск аккаунтов, затем ожидание отмены оператором
    pub async fn run(&mut self) -> Result<RunState> {
        match self.launch_accounts().await? {
            LaunchOutcome::Processed => {
                info!("Все аккаунты обработаны. Нажмите Ctrl+C для выхода.");
                self.cancel.cancelled().await;
                self.state = RunState::Completed;
            }
            LaunchOutcome::Cancelled => {
                warn!("Запуск аккаунтов прерван");
            }
        }

        Ok(self.state)
    }

    /// Запускает клиенты и обрабатывает все аккаунты, не дожидаясь отмены.
    ///
    /// Ошибка возвращается только если не удалось получить исходный снимок окон.
    pub async fn launch_accounts(&mut self) -> Result<LaunchOutcome> {
        self.state = RunState::Running;
        info!("Загружено {} аккаунтов из конфигурации", self.config.accounts.len());

        // Исходный снимок: эти окна никогда не будут сопоставлены аккаунтам
        let initial = self.windows.snapshot()?;
        self.tracker = WindowTracker::new(initial);
        info!("Найдено {} уже открытых окон клиента", self.tracker.initial_count());

        if !self.spawn_clients() {
            return Ok(self.cancelled());
        }

        info!("Ожидание открытия окон...");
        let grace = Duration::from_millis(self.config.launch.grace_period_ms);
        if !self.pause(grace).await {
            return Ok(self.cancelled());
        }

        let config = Arc::clone(&self.config);
        for (index, account) in config.accounts.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(self.cancelled());
            }

            if self.statuses[index].is_skipped() {
                debug!("Аккаунт {} пропущен: клиент не был запущен", account.username);
                continue;
            }

            match self.wait_for_next_window(&account.username).await {
                Discovery::Found(handle) => {
                    self.set_status(index, AccountStatus::WindowFound(handle));
                    self.sign_in(account, handle);
                    self.set_status(index, AccountStatus::LoggedIn(handle));
                }
                Discovery::TimedOut => {
                    warn!("Не удалось дождаться окна для аккаунта {}", account.username);
                    self.set_status(index, AccountStatus::WindowTimeout);
                    self.set_status(index, AccountStatus::Skipped(SkipReason::WindowTimeout));
                }
                Discovery::Cancelled => return Ok(self.cancelled()),
            }
        }

        Ok(LaunchOutcome::Processed)
    }

    /// Освобождает дескрипторы запущенных клиентов, не завершая их
    pub fn release_processes(&mut self) {
        let count = self.processes.len();
        for process in self.processes.drain(..) {
            process.release();
        }
        if count > 0 {
            info!("Освобождено {} дескрипторов процессов клиента", count);
        }
    }

    /// Возвращает `false`, если запуск был отменён до того, как все клиенты запущены
    fn spawn_clients(&mut self) -> bool {
        let config = Arc::clone(&self.config);

        for (index, account) in config.accounts.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return false;
            }

            info!("Запуск клиента для аккаунта {}...", account.username);
            match self.launcher.launch(&config.install_dir) {
                Ok(process) => {
                    debug!("Клиент аккаунта {} запущен (pid {})", account.username, process.pid());
                    self.processes.push(process);
                    self.set_status(index, AccountStatus::Spawned);
                }
                Err(e) => {
                    error!("Не удалось запустить клиент для аккаунта {}: {}", account.username, e);
                    self.set_status(index, AccountStatus::Skipped(SkipReason::SpawnFailed));
                }
            }
        }

        true
    }

    /// Опрашивает реестр окон, пока не появится окно, не входящее ни в
    /// исходный снимок, ни в уже сопоставленные.
    async fn wait_for_next_window(&mut self, username: &str) -> Discovery {
        let attempts = self.config.launch.poll_attempts;
        let delay = Duration::from_millis(self.config.launch.poll_interval_ms);

        info!("Ожидание окна для аккаунта {}...", username);

        for attempt in 1..=attempts {
            let snapshot = match self.windows.snapshot() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(
                        "Не удалось получить список окон (попытка {}/{}): {}",
                        attempt, attempts, e
                    );
                    BTreeSet::new()
                }
            };

            if let Some(handle) = self.tracker.claim_new(&snapshot) {
                debug!(
                    "Окно {} закреплено за аккаунтом {} (попытка {}, всего закреплено {})",
                    handle,
                    username,
                    attempt,
                    self.tracker.claimed().len()
                );
                return Discovery::Found(handle);
            }

            debug_if_enabled!("Попытка {}/{}: новых окон нет", attempt, attempts);

            if attempt < attempts && !self.pause(delay).await {
                return Discovery::Cancelled;
            }
        }

        Discovery::TimedOut
    }

    /// Вход и размещение. Ошибки WinAPI только логируются: обратной связи
    /// от окна всё равно нет, а остальные аккаунты должны продолжить запуск.
    fn sign_in(&self, account: &Account, handle: WindowHandle) {
        info!("Вход в аккаунт {} (окно {})", account.username, handle);

        // Форма входа: имя -> TAB -> пароль -> ENTER
        let keys = format!("{}\t{}\r", account.username, account.password);
        if let Err(e) = self.windows.send_keys(handle, &keys) {
            warn!(
                "Не удалось ввести данные аккаунта {} в окно {}: {}",
                account.username, handle, e
            );
        }

        let title = self.config.client.window_title(&account.username);
        if let Err(e) = self.windows.set_title(handle, &title) {
            warn!("Не удалось задать заголовок окна {}: {}", handle, e);
        }

        if let Err(e) = self.windows.move_to(handle, account.x, account.y) {
            warn!("Не удалось переместить окно {} в ({}, {}): {}", handle, account.x, account.y, e);
        }

        info!(
            "Аккаунт {} вошёл, окно размещено в ({}, {})",
            account.username, account.x, account.y
        );
    }

    /// Ждёт `duration`, возвращает `false` при отмене
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = sleep(duration) => true,
        }
    }

    fn set_status(&mut self, index: usize, status: AccountStatus) {
        let previous = std::mem::replace(&mut self.statuses[index], status);
        debug!(
            "Аккаунт {}: {} -> {}",
            self.config.accounts[index].username, previous, status
        );
    }

    fn cancelled(&mut self) -> LaunchOutcome {
        self.state = RunState::Cancelled;
        LaunchOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LauncherError;
    use crate::services::window_manager::{WindowActuator, WindowRegistry};
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Action {
        Keys(WindowHandle, String),
        Title(WindowHandle, String),
        Move(WindowHandle, i32, i32),
    }

    /// Что происходит при N-м запуске (нумерация с 1)
    #[derive(Debug, Clone, Copy)]
    enum LaunchScript {
        Fail,
        NoWindow,
        /// Окно становится видимым начиная с указанного номера снимка
        WindowAt(usize),
    }

    #[derive(Default)]
    struct FakeState {
        visible: BTreeSet<WindowHandle>,
        pending: Vec<(usize, WindowHandle)>,
        scripts: HashMap<usize, LaunchScript>,
        launches: usize,
        snapshots: usize,
        failing_snapshots: HashSet<usize>,
        cancel_on_snapshot: Option<usize>,
        failing_actuator: bool,
        actions: Vec<Action>,
    }

    struct FakeDesktop {
        state: Mutex<FakeState>,
        cancel: CancellationToken,
    }

    impl FakeDesktop {
        fn new(cancel: CancellationToken) -> Self {
            Self {
                state: Mutex::new(FakeState::default()),
                cancel,
            }
        }

        fn with_existing(self, raw: &[isize]) -> Self {
            self.state.lock().visible.extend(raw.iter().copied().map(WindowHandle::from_raw));
            self
        }

        fn script(self, launch: usize, script: LaunchScript) -> Self {
            self.state.lock().scripts.insert(launch, script);
            self
        }

        fn cancel_on_snapshot(self, snapshot: usize) -> Self {
            self.state.lock().cancel_on_snapshot = Some(snapshot);
            self
        }

        fn fail_snapshot(self, snapshot: usize) -> Self {
            self.state.lock().failing_snapshots.insert(snapshot);
            self
        }

        fn failing_actuator(self) -> Self {
            self.state.lock().failing_actuator = true;
            self
        }

        fn actions(&self) -> Vec<Action> {
            self.state.lock().actions.clone()
        }

        fn launches(&self) -> usize {
            self.state.lock().launches
        }

        fn snapshots(&self) -> usize {
            self.state.lock().snapshots
        }

        fn actuate(&self, action: Action) -> Result<()> {
            let mut state = self.state.lock();
            if state.failing_actuator {
                return Err(LauncherError::WindowApi("окно не отвечает".to_string()));
            }
            state.actions.push(action);
            Ok(())
        }
    }

    /// Окно N-го запуска
    fn window_of(launch: isize) -> WindowHandle {
        WindowHandle::from_raw(launch * 100)
    }

    impl ProcessLauncher for FakeDesktop {
        fn launch(&self, install_dir: &Path) -> Result<ProcessHandle> {
            let mut state = self.state.lock();
            state.launches += 1;
            let launch = state.launches;

            match state.scripts.get(&launch).copied().unwrap_or(LaunchScript::WindowAt(0)) {
                LaunchScript::Fail => Err(LauncherError::Spawn {
                    path: install_dir.join("client.exe"),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "нет файла"),
                }),
                LaunchScript::NoWindow => Ok(ProcessHandle::detached(launch as u32)),
                LaunchScript::WindowAt(snapshot) => {
                    state.pending.push((snapshot, window_of(launch as isize)));
                    Ok(ProcessHandle::detached(launch as u32))
                }
            }
        }
    }

    impl WindowRegistry for FakeDesktop {
        fn snapshot(&self) -> Result<BTreeSet<WindowHandle>> {
            let mut state = self.state.lock();
            state.snapshots += 1;
            let current = state.snapshots;

            if state.cancel_on_snapshot == Some(current) {
                self.cancel.cancel();
            }

            let (ready, waiting): (Vec<_>, Vec<_>) =
                state.pending.drain(..).partition(|(at, _)| *at <= current);
            state.pending = waiting;
            state.visible.extend(ready.into_iter().map(|(_, handle)| handle));

            if state.failing_snapshots.contains(&current) {
                return Err(LauncherError::WindowApi("EnumWindows".to_string()));
            }
            Ok(state.visible.clone())
        }
    }

    impl WindowActuator for FakeDesktop {
        fn send_keys(&self, handle: WindowHandle, text: &str) -> Result<()> {
            self.actuate(Action::Keys(handle, text.to_string()))
        }

        fn set_title(&self, handle: WindowHandle, title: &str) -> Result<()> {
            self.actuate(Action::Title(handle, title.to_string()))
        }

        fn move_to(&self, handle: WindowHandle, x: i32, y: i32) -> Result<()> {
            self.actuate(Action::Move(handle, x, y))
        }
    }

    fn test_config(accounts: Vec<Account>) -> Arc<Config> {
        let mut config = Config::new("C:/Games/Wizard101", accounts);
        config.launch.grace_period_ms = 2000;
        config.launch.poll_interval_ms = 500;
        config.launch.poll_attempts = 3;
        Arc::new(config)
    }

    fn accounts(names: &[&str]) -> Vec<Account> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Account::new(*name, format!("pw-{}", name), i as i32 * 10, i as i32 * 20)
            })
            .collect()
    }

    fn orchestrator(
        config: Arc<Config>,
        desktop: &Arc<FakeDesktop>,
        cancel: &CancellationToken,
    ) -> LaunchOrchestrator {
        let launcher: Arc<dyn ProcessLauncher> = desktop.clone();
        let windows: Arc<dyn WindowManager> = desktop.clone();
        LaunchOrchestrator::new(config, launcher, windows, cancel.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_alice_and_bob() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(FakeDesktop::new(cancel.clone()));
        let config = test_config(vec![
            Account::new("alice", "pw", 0, 0),
            Account::new("bob", "pw", 100, 200),
        ]);
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        let outcome = orchestrator.launch_accounts().await.unwrap();

        assert_eq!(outcome, LaunchOutcome::Processed);
        let alice = window_of(1);
        let bob = window_of(2);
        assert_eq!(
            desktop.actions(),
            vec![
                Action::Keys(alice, "alice\tpw\r".to_string()),
                Action::Title(alice, "[alice] Wizard101".to_string()),
                Action::Move(alice, 0, 0),
                Action::Keys(bob, "bob\tpw\r".to_string()),
                Action::Title(bob, "[bob] Wizard101".to_string()),
                Action::Move(bob, 100, 200),
            ]
        );
        assert_eq!(
            orchestrator.statuses(),
            &[AccountStatus::LoggedIn(alice), AccountStatus::LoggedIn(bob)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn claims_one_distinct_window_per_account_in_order() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(FakeDesktop::new(cancel.clone()).with_existing(&[150, 999]));
        let config = test_config(accounts(&["a", "b", "c", "d"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        orchestrator.launch_accounts().await.unwrap();

        let expected: Vec<AccountStatus> = (1..=4)
            .map(|launch| AccountStatus::LoggedIn(window_of(launch)))
            .collect();
        assert_eq!(orchestrator.statuses(), expected.as_slice());

        let claimed = orchestrator.claimed_windows();
        assert_eq!(claimed.len(), 4);
        assert!(!claimed.contains(&WindowHandle::from_raw(150)));
        assert!(!claimed.contains(&WindowHandle::from_raw(999)));
        assert_eq!(orchestrator.process_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn preexisting_windows_only_give_timeouts() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(
            FakeDesktop::new(cancel.clone())
                .with_existing(&[1, 2, 3])
                .script(1, LaunchScript::NoWindow),
        );
        let config = test_config(accounts(&["a"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        orchestrator.launch_accounts().await.unwrap();

        assert_eq!(
            orchestrator.statuses(),
            &[AccountStatus::Skipped(SkipReason::WindowTimeout)]
        );
        assert!(orchestrator.claimed_windows().is_empty());
        assert!(desktop.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_failure_skips_account_without_compensating_claim() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(FakeDesktop::new(cancel.clone()).script(2, LaunchScript::Fail));
        let config = test_config(accounts(&["a", "b", "c"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        let outcome = orchestrator.launch_accounts().await.unwrap();

        assert_eq!(outcome, LaunchOutcome::Processed);
        assert_eq!(desktop.launches(), 3);
        assert_eq!(orchestrator.process_count(), 2);
        assert_eq!(
            orchestrator.statuses(),
            &[
                AccountStatus::LoggedIn(window_of(1)),
                AccountStatus::Skipped(SkipReason::SpawnFailed),
                AccountStatus::LoggedIn(window_of(3)),
            ]
        );
        assert_eq!(orchestrator.claimed_windows().len(), 2);
        // initial + a + c, без опроса для b
        assert_eq!(desktop.snapshots(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn window_timeout_does_not_leak_slot_to_next_account() {
        let cancel = CancellationToken::new();
        // Снимки: #1 исходный, #2 окно a, #3..#5 таймаут b, #6 окно c
        let desktop = Arc::new(
            FakeDesktop::new(cancel.clone())
                .script(2, LaunchScript::NoWindow)
                .script(3, LaunchScript::WindowAt(6)),
        );
        let config = test_config(accounts(&["a", "b", "c"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        let start = Instant::now();
        orchestrator.launch_accounts().await.unwrap();

        assert_eq!(
            orchestrator.statuses(),
            &[
                AccountStatus::LoggedIn(window_of(1)),
                AccountStatus::Skipped(SkipReason::WindowTimeout),
                AccountStatus::LoggedIn(window_of(3)),
            ]
        );
        assert_eq!(desktop.snapshots(), 6);
        // grace + две паузы внутри бюджета b
        assert_eq!(start.elapsed(), Duration::from_millis(2000 + 2 * 500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_poll_stops_processing() {
        let cancel = CancellationToken::new();
        // #1 исходный, #2 окно a, #3 и #4 опрос b, отмена на #4
        let desktop = Arc::new(
            FakeDesktop::new(cancel.clone())
                .script(2, LaunchScript::NoWindow)
                .script(3, LaunchScript::NoWindow)
                .cancel_on_snapshot(4),
        );
        let config = test_config(accounts(&["a", "b", "c"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        let start = Instant::now();
        let outcome = orchestrator.launch_accounts().await.unwrap();

        assert_eq!(outcome, LaunchOutcome::Cancelled);
        assert_eq!(orchestrator.state(), RunState::Cancelled);
        assert_eq!(desktop.snapshots(), 4);
        assert_eq!(
            orchestrator.statuses(),
            &[
                AccountStatus::LoggedIn(window_of(1)),
                AccountStatus::Spawned,
                AccountStatus::Spawned,
            ]
        );
        assert_eq!(orchestrator.claimed_windows().len(), 1);
        assert!(start.elapsed() <= Duration::from_millis(2000 + 2 * 500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_launch_spawns_nothing() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(FakeDesktop::new(cancel.clone()));
        let config = test_config(accounts(&["a", "b"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        cancel.cancel();
        let outcome = orchestrator.launch_accounts().await.unwrap();

        assert_eq!(outcome, LaunchOutcome::Cancelled);
        assert_eq!(desktop.launches(), 0);
        assert_eq!(orchestrator.statuses(), &[AccountStatus::Pending, AccountStatus::Pending]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_grace_period_skips_polling() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(FakeDesktop::new(cancel.clone()));
        let config = test_config(accounts(&["a", "b"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        let canceller = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let outcome = orchestrator.launch_accounts().await.unwrap();

        assert_eq!(outcome, LaunchOutcome::Cancelled);
        assert_eq!(start.elapsed(), Duration::from_millis(100));
        assert_eq!(desktop.launches(), 2);
        // Только исходный снимок
        assert_eq!(desktop.snapshots(), 1);
        assert!(desktop.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_errors_during_polling_are_tolerated() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(FakeDesktop::new(cancel.clone()).fail_snapshot(2));
        let config = test_config(accounts(&["a"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        orchestrator.launch_accounts().await.unwrap();

        assert_eq!(orchestrator.statuses(), &[AccountStatus::LoggedIn(window_of(1))]);
        assert_eq!(desktop.snapshots(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn initial_snapshot_failure_is_fatal() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(FakeDesktop::new(cancel.clone()).fail_snapshot(1));
        let config = test_config(accounts(&["a"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        let result = orchestrator.launch_accounts().await;

        assert!(matches!(result, Err(LauncherError::WindowApi(_))));
        assert_eq!(desktop.launches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn actuation_failures_do_not_stop_the_run() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(FakeDesktop::new(cancel.clone()).failing_actuator());
        let config = test_config(accounts(&["a", "b"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        let outcome = orchestrator.launch_accounts().await.unwrap();

        assert_eq!(outcome, LaunchOutcome::Processed);
        assert_eq!(
            orchestrator.statuses(),
            &[
                AccountStatus::LoggedIn(window_of(1)),
                AccountStatus::LoggedIn(window_of(2)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_blocks_until_cancelled_then_completes() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(FakeDesktop::new(cancel.clone()));
        let config = test_config(accounts(&["a"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        let canceller = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(60)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let state = orchestrator.run().await.unwrap();

        assert_eq!(state, RunState::Completed);
        assert_eq!(start.elapsed(), Duration::from_secs(60));

        orchestrator.release_processes();
        assert_eq!(orchestrator.process_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_reports_cancelled_when_interrupted_mid_launch() {
        let cancel = CancellationToken::new();
        let desktop = Arc::new(
            FakeDesktop::new(cancel.clone())
                .script(1, LaunchScript::NoWindow)
                .cancel_on_snapshot(2),
        );
        let config = test_config(accounts(&["a"]));
        let mut orchestrator = orchestrator(config, &desktop, &cancel);

        assert_eq!(orchestrator.state(), RunState::Idle);
        let state = orchestrator.run().await.unwrap();

        assert_eq!(state, RunState::Cancelled);
        assert_eq!(orchestrator.process_count(), 1);
    }
}
