use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use compactor_core::{
    update, AppState, Msg, Outcome, ProgressRing, SelectedFile, SessionState, Timings,
};
use compactor_engine::{
    guess_mime, remove_stale_files, EngineHandle, ReqwestJobClient, STALE_DOWNLOAD_AGE,
};
use compactor_logging::{compactor_debug, compactor_info, compactor_warn};

use super::cli::Cli;
use super::config::{AppConfig, DEFAULT_CONFIG_FILENAME};
use super::effects::{spawn_event_forwarder, EffectRunner};
use super::logging;
use super::scheduler::{Scheduler, ThreadScheduler};
use super::ui::render::render;
use super::ui::surface::{Surface, TerminalSurface};

/// Exit status after Ctrl-C, matching the shell convention for SIGINT.
const EXIT_CANCELLED: u8 = 130;
/// How long a fire-and-forget cancel request gets before the process exits.
const CANCEL_GRACE: Duration = Duration::from_millis(500);
/// How long to wait for the reply to a start abandoned by Ctrl-C, so the job
/// it created can be cancelled.
const START_RELEASE_WAIT: Duration = Duration::from_secs(10);

pub fn run_app() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    let mut config = AppConfig::load(&config_path)?;
    config.apply_cli(&cli);

    if cli.init_config {
        let written = config.save(&config_path)?;
        println!("Wrote {}", written.display());
        return Ok(ExitCode::SUCCESS);
    }

    logging::initialize(config.log_destination, config.level()?);
    compactor_info!("Compactor starting against {}", config.server_url);

    match remove_stale_files(&config.output_dir, STALE_DOWNLOAD_AGE) {
        Ok(0) => {}
        Ok(removed) => compactor_info!("Removed {} stale downloads", removed),
        Err(err) => compactor_warn!("Stale download cleanup failed: {}", err),
    }

    let Some(file_path) = cli.file.as_deref() else {
        bail!("no input file given");
    };
    let file = selected_file(file_path)?;
    let options = config.options();

    let client = ReqwestJobClient::new(config.client_settings())
        .context("failed to build HTTP client")?;
    let (engine, events) = EngineHandle::new(Arc::new(client), config.output_dir.clone());

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    spawn_event_forwarder(events, msg_tx.clone());
    spawn_interrupt_listener(msg_tx.clone())?;

    let runner = EffectRunner::new(engine, ThreadScheduler::new(msg_tx));
    let mut controller = Controller::new(
        config.timings(),
        ProgressRing::new(config.ring_radius),
        runner,
        TerminalSurface::new(),
    );

    controller.dispatch(Msg::OptionsChanged(options));
    controller.dispatch(Msg::FilePicked(file));
    controller.dispatch(Msg::SubmitClicked);

    run_until_settled(&mut controller, &msg_rx, START_RELEASE_WAIT)?;

    if controller.cancel_in_flight() {
        thread::sleep(CANCEL_GRACE);
    }
    let code = controller.exit_code();
    compactor_info!("Compactor finished with status {}", code);
    Ok(ExitCode::from(code))
}

/// Dispatch messages until the controller settles. Replies to abandoned starts
/// are still awaited for up to `release_wait` so their jobs get cancelled.
fn run_until_settled<S: Scheduler, U: Surface>(
    controller: &mut Controller<S, U>,
    msg_rx: &mpsc::Receiver<Msg>,
    release_wait: Duration,
) -> anyhow::Result<()> {
    let mut release_deadline: Option<Instant> = None;
    loop {
        let msg = if !controller.is_settled() {
            msg_rx
                .recv()
                .map_err(|_| anyhow!("control loop channel closed"))?
        } else if controller.state().abandoned_starts() == 0 {
            return Ok(());
        } else {
            let deadline =
                *release_deadline.get_or_insert_with(|| Instant::now() + release_wait);
            match msg_rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(msg) => msg,
                Err(RecvTimeoutError::Timeout) => {
                    compactor_warn!(
                        "No reply for {} abandoned start(s); exiting without cancelling",
                        controller.state().abandoned_starts()
                    );
                    return Ok(());
                }
                Err(RecvTimeoutError::Disconnected) => bail!("control loop channel closed"),
            }
        };
        controller.dispatch(msg);
    }
}

fn selected_file(path: &Path) -> anyhow::Result<SelectedFile> {
    if !path.is_file() {
        bail!("{} is not a readable file", path.display());
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile {
        name,
        mime_type: guess_mime(path),
        path: path.to_path_buf(),
    })
}

/// Turns Ctrl-C into cancel clicks for as long as the control loop listens.
fn spawn_interrupt_listener(msg_tx: mpsc::Sender<Msg>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build signal runtime")?;
    thread::spawn(move || {
        runtime.block_on(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                compactor_debug!("Interrupt received");
                if msg_tx.send(Msg::CancelClicked).is_err() {
                    break;
                }
            }
        });
    });
    Ok(())
}

/// Owns the state and routes every message through `update`, then renders and
/// executes the resulting effects.
pub struct Controller<S: Scheduler, U: Surface> {
    state: AppState,
    ring: ProgressRing,
    runner: EffectRunner<S>,
    surface: U,
}

impl<S: Scheduler, U: Surface> Controller<S, U> {
    pub fn new(timings: Timings, ring: ProgressRing, runner: EffectRunner<S>, surface: U) -> Self {
        let mut controller = Self {
            state: AppState::with_timings(timings),
            ring,
            runner,
            surface,
        };
        render(&controller.state.view(), &controller.ring, &mut controller.surface);
        controller
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        compactor_logging::set_poll_tick(state.poll_ticks());
        if state.consume_dirty() {
            render(&state.view(), &self.ring, &mut self.surface);
        }
        self.state = state;
        self.runner.run(effects, &mut self.surface);
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// True once the submitted job has reached a final outcome and every
    /// download it triggered has been written or has failed.
    pub fn is_settled(&self) -> bool {
        let view = self.state.view();
        view.session == SessionState::Idle
            && view.last_outcome.is_some()
            && view.downloads_pending == 0
    }

    /// True when the job was cancelled and a cancel request actually went out.
    pub fn cancel_in_flight(&self) -> bool {
        self.state.view().last_outcome == Some(Outcome::Cancelled) && self.runner.cancels_sent() > 0
    }

    pub fn exit_code(&self) -> u8 {
        let view = self.state.view();
        match view.last_outcome {
            Some(Outcome::Completed { .. }) if view.last_download.is_some() => 0,
            Some(Outcome::Cancelled) | Some(Outcome::Deleted) => EXIT_CANCELLED,
            _ => 1,
        }
    }

    #[cfg(test)]
    fn surface(&self) -> &U {
        &self.surface
    }

    #[cfg(test)]
    fn runner_mut(&mut self) -> &mut EffectRunner<S> {
        &mut self.runner
    }
}
