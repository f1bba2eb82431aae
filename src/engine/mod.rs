//! Engine process bridge: spawns the external rendering engine for one
//! request, pumps its progress channel into the relay, and parses the
//! terminal payload from its stdout.
//!
//! The progress channel is a loopback TCP listener bound before the engine
//! is spawned. The engine connects to the well-known address on its own; the
//! bridge never pushes the address through another route, so an engine that
//! races the bind must retry on its side. One connection per run, then the
//! listener is dropped.

pub mod wire;

use async_trait::async_trait;
use std::net::SocketAddr;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::relay::ProgressRelay;
use crate::request::AssemblyRequest;
use wire::{EngineJob, GenerationOutcome, parse_frame, parse_terminal};

/// Launches one engine run per request. The subprocess transport is the
/// production implementation; tests swap in scripted launchers.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn submit(&self, request: AssemblyRequest) -> RunningAssembly;
}

/// Handle to one in-flight assembly. The relay can be subscribed at any
/// point; `wait` resolves with the run's terminal outcome.
#[derive(Debug)]
pub struct RunningAssembly {
    relay: ProgressRelay,
    handle: JoinHandle<GenerationOutcome>,
}

impl RunningAssembly {
    pub fn new(relay: ProgressRelay, handle: JoinHandle<GenerationOutcome>) -> Self {
        RunningAssembly { relay, handle }
    }

    pub fn relay(&self) -> &ProgressRelay {
        &self.relay
    }

    pub async fn wait(self) -> GenerationOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(?err, "assembly task aborted");
                GenerationOutcome::Failure {
                    message: "assembly task aborted".to_string(),
                }
            }
        }
    }

    fn already_failed(relay: ProgressRelay, message: String) -> Self {
        let outcome = GenerationOutcome::Failure { message };
        relay.finish(outcome.clone());
        RunningAssembly {
            relay,
            handle: tokio::spawn(async move { outcome }),
        }
    }
}

/// Runs the engine as a child process, passing the serialized job as its
/// sole argument.
pub struct SubprocessEngine {
    command: String,
    channel_addr: SocketAddr,
}

impl SubprocessEngine {
    pub fn new(command: impl Into<String>, channel_addr: SocketAddr) -> Self {
        SubprocessEngine {
            command: command.into(),
            channel_addr,
        }
    }
}

#[async_trait]
impl EngineLauncher for SubprocessEngine {
    async fn submit(&self, request: AssemblyRequest) -> RunningAssembly {
        let relay = ProgressRelay::new();

        // Bind before spawning so a prompt engine finds the channel listening.
        let listener = match TcpListener::bind(self.channel_addr).await {
            Ok(listener) => listener,
            Err(err) => {
                return RunningAssembly::already_failed(
                    relay,
                    format!("could not open progress channel: {err}"),
                );
            }
        };

        let job = EngineJob::from_request(&request);
        let job_json = serde_json::to_string(&job).unwrap_or_default();

        let mut child = match Command::new(&self.command)
            .arg(&job_json)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                return RunningAssembly::already_failed(
                    relay,
                    format!("could not start rendering engine: {err}"),
                );
            }
        };

        let pump = tokio::spawn(pump_progress(listener, relay.clone()));

        let relay_for_task = relay.clone();
        let handle = tokio::spawn(async move {
            let outcome = match child.stdout.take() {
                Some(stdout) => {
                    let mut lines = BufReader::new(stdout).lines();
                    let mut last = String::new();
                    while let Ok(Some(line)) = lines.next_line().await {
                        if !line.trim().is_empty() {
                            last = line;
                        }
                    }
                    let status = child.wait().await;
                    if last.is_empty() {
                        let detail = match status {
                            Ok(status) => format!("engine exited without a result ({status})"),
                            Err(err) => format!("engine exited without a result: {err}"),
                        };
                        GenerationOutcome::Failure { message: detail }
                    } else {
                        parse_terminal(&last)
                    }
                }
                None => GenerationOutcome::Failure {
                    message: "engine stdout was not captured".to_string(),
                },
            };

            pump.abort();
            relay_for_task.finish(outcome.clone());
            outcome
        });

        RunningAssembly { relay, handle }
    }
}

/// Accept the engine's single connection and forward its frames into the
/// relay. Malformed frames are dropped and counted; they never close the
/// channel.
pub(crate) async fn pump_progress(listener: TcpListener, relay: ProgressRelay) {
    let (stream, peer) = match listener.accept().await {
        Ok(accepted) => accepted,
        Err(err) => {
            warn!(?err, "progress channel accept failed");
            return;
        }
    };
    debug!(%peer, "engine connected to progress channel");
    drop(listener);

    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        match parse_frame(&line) {
            Ok(frame) => relay.emit(frame),
            Err(err) => {
                relay.count_malformed();
                debug!(?err, "dropping malformed progress frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{Case, DocumentReference};
    use crate::relay::AssemblyEvent;
    use crate::request::{FixedOutput, build_request};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    fn request(output: &std::path::Path) -> AssemblyRequest {
        let mut case = Case::new("c1", "Smith v. Jones");
        case.main = Some(DocumentReference::from_path("/a/brief.docx"));
        case.attachments = vec![DocumentReference::named("Exhibit 1", "/a/ex1.pdf")];
        let mut picker = FixedOutput(output.to_path_buf());
        build_request(&case, &mut picker, false).unwrap()
    }

    #[tokio::test]
    async fn pump_forwards_frames_and_counts_malformed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let relay = ProgressRelay::new();
        let mut sub = relay.subscribe();

        let pump = tokio::spawn(pump_progress(listener, relay.clone()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(
                concat!(
                    r#"{"step":1,"total":3,"message":"converting brief","phase":"converting","file":null}"#,
                    "\n",
                    "this line is not json\n",
                    r#"{"step":2,"total":3,"message":"merging","phase":"merging","file":null}"#,
                    "\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        stream.shutdown().await.unwrap();
        pump.await.unwrap();

        match sub.next().await.unwrap() {
            AssemblyEvent::Progress(frame) => assert_eq!(frame.step, 1),
            other => panic!("unexpected event: {other:?}"),
        }
        match sub.next().await.unwrap() {
            AssemblyEvent::Progress(frame) => assert_eq!(frame.step, 2),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(relay.malformed_frames(), 1);
    }

    #[tokio::test]
    async fn spawn_failure_is_an_immediate_failure_outcome() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = SubprocessEngine::new(
            "/definitely/not/a/real/engine",
            "127.0.0.1:0".parse().unwrap(),
        );
        let running = engine.submit(request(&tmp.path().join("out.pdf"))).await;
        assert!(running.relay().is_finished());
        match running.wait().await {
            GenerationOutcome::Failure { message } => {
                assert!(message.contains("could not start rendering engine"), "{message}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn scripted_engine_round_trip() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("fake-engine.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             echo '{\"status\":\"success\",\"output\":{\"path\":\"/out/filing.pdf\",\"url\":null,\"updated\":\"2026-08-29T10:00:00Z\"}}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = SubprocessEngine::new(
            script.to_string_lossy().into_owned(),
            "127.0.0.1:0".parse().unwrap(),
        );
        let running = engine.submit(request(&tmp.path().join("out.pdf"))).await;
        match running.wait().await {
            GenerationOutcome::Success(artifact) => {
                assert_eq!(artifact.path, std::path::PathBuf::from("/out/filing.pdf"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn engine_error_payload_surfaces_verbatim() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("fake-engine.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             echo '{\"status\":\"error\",\"error\":{\"message\":\"merge failed on page 3\"}}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = SubprocessEngine::new(
            script.to_string_lossy().into_owned(),
            "127.0.0.1:0".parse().unwrap(),
        );
        let running = engine.submit(request(&tmp.path().join("out.pdf"))).await;
        assert_eq!(
            running.wait().await,
            GenerationOutcome::Failure {
                message: "merge failed on page 3".to_string()
            }
        );
    }
}
