//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{timeout_at, Instant};

use tracing::debug;

use crate::error::MinerError;

/// A single PV line from multi-PV analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PvLine {
    /// Principal variation moves
    pub pv: Vec<String>,
    /// Centipawn score (side to move)
    pub cp: Option<i32>,
    /// Mate in N
    pub mate: Option<i32>,
}

impl PvLine {
    pub fn cp(cp: i32) -> Self {
        Self {
            cp: Some(cp),
            ..Default::default()
        }
    }

    pub fn mate(mate: i32) -> Self {
        Self {
            mate: Some(mate),
            ..Default::default()
        }
    }
}

/// One multi-PV search request.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest {
    pub multipv: u32,
    pub movetime: Duration,
    /// Extra wait before the search is abandoned
    pub grace: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub threads: u32,
    pub hash_mb: u32,
}

/// Anything that can analyse a FEN position. Calls are strictly sequential.
#[allow(async_fn_in_trait)]
pub trait PositionAnalyzer {
    async fn analyse(&mut self, fen: &str, request: &AnalysisRequest)
        -> Result<Vec<PvLine>, MinerError>;
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    multipv: u32,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str, options: &EngineOptions) -> Result<Self, MinerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MinerError::Stockfish(format!("Failed to spawn Stockfish at {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| MinerError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| MinerError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            multipv: 1,
        };

        // Initialize UCI
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        // Configure for analysis
        engine
            .send(&format!("setoption name Threads value {}", options.threads))
            .await?;
        engine
            .send(&format!("setoption name Hash value {}", options.hash_mb))
            .await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), MinerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| MinerError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| MinerError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one line; end of output means the process is gone
    async fn read_line(&mut self, line: &mut String) -> Result<(), MinerError> {
        line.clear();
        let n = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| MinerError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if n == 0 {
            return Err(MinerError::Stockfish("Stockfish closed its output".into()));
        }
        debug!(line = line.trim(), "SF >");
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), MinerError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            if line.trim() == expected {
                return Ok(());
            }
        }
    }

    /// Stop a running search and consume its `bestmove`
    async fn abort_search(&mut self, grace: Duration) -> Result<(), MinerError> {
        self.send("stop").await?;
        let deadline = Instant::now() + grace;
        let mut line = String::new();
        loop {
            match timeout_at(deadline, self.read_line(&mut line)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(MinerError::Stockfish(
                        "Stockfish did not answer stop".into(),
                    ))
                }
            }
            if line.trim_start().starts_with("bestmove") {
                return Ok(());
            }
        }
    }

    /// Evaluate a position with multiple PV lines, searching for `movetime`.
    /// Lines are returned in multipv order; unfilled slots are dropped.
    pub async fn evaluate_multipv(
        &mut self,
        fen: &str,
        request: &AnalysisRequest,
    ) -> Result<Vec<PvLine>, MinerError> {
        if self.multipv != request.multipv {
            self.send(&format!("setoption name MultiPV value {}", request.multipv))
                .await?;
            self.multipv = request.multipv;
        }
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go movetime {}", request.movetime.as_millis()))
            .await?;

        let budget = request.movetime + request.grace;
        let deadline = Instant::now() + budget;
        let mut lines: Vec<Option<PvLine>> = vec![None; request.multipv as usize];
        let mut line = String::new();

        loop {
            match timeout_at(deadline, self.read_line(&mut line)).await {
                Ok(result) => result?,
                Err(_) => {
                    self.abort_search(request.grace).await?;
                    return Err(MinerError::Timeout(budget));
                }
            }
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                // Parse multipv index (1-based)
                let pv_idx = parse_multipv_index(trimmed).unwrap_or(1).max(1) - 1;
                if let Some(slot) = lines.get_mut(pv_idx as usize) {
                    *slot = Some(PvLine {
                        pv: parse_pv(trimmed),
                        cp: parse_cp(trimmed),
                        mate: parse_mate(trimmed),
                    });
                }
            } else if trimmed.starts_with("bestmove") {
                break;
            }
        }

        Ok(lines.into_iter().flatten().collect())
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl PositionAnalyzer for StockfishEngine {
    async fn analyse(
        &mut self,
        fen: &str,
        request: &AnalysisRequest,
    ) -> Result<Vec<PvLine>, MinerError> {
        self.evaluate_multipv(fen, request).await
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Value following `key` in an info line
fn parse_after<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    parts
        .iter()
        .position(|part| *part == key)
        .and_then(|i| parts.get(i + 1))
        .and_then(|v| v.parse().ok())
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    parse_after(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    parse_after(line, "mate")
}

/// Parse multipv index from info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    parse_after(line, "multipv")
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in parts {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at next keyword or end of line
            if part.starts_with("bmc") || part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_cp(line), Some(35));
        assert_eq!(parse_mate(line), None);
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate -3 nodes 100000 pv e2e4";
        assert_eq!(parse_mate(line), Some(-3));
        assert_eq!(parse_cp(line), None);
    }

    #[test]
    fn test_parse_multipv_index() {
        let line = "info depth 12 multipv 3 score cp -20 pv d2d4 d7d5";
        assert_eq!(parse_multipv_index(line), Some(3));
        assert_eq!(parse_multipv_index("info depth 1 score cp 3 pv e2e4"), None);
    }

    #[test]
    fn test_parse_pv() {
        let line = "info depth 20 score cp 35 pv e2e4 e7e5 g1f3";
        let pv = parse_pv(line);
        assert_eq!(pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    /// Answers searches on White-to-move positions at once and sits on
    /// Black-to-move searches until it is told to stop.
    #[cfg(unix)]
    const SCRIPTED_ENGINE: &str = r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "id name scripted"; echo "uciok" ;;
    isready) echo "readyok" ;;
    "position fen "*) fen="${line#position fen }" ;;
    go*)
      case "$fen" in
        *" b "*) ;;
        *)
          echo "info depth 1 multipv 1 score cp 30 pv e2e4 e7e5"
          echo "info depth 1 multipv 2 score cp 20 pv d2d4"
          echo "info depth 1 multipv 3 score mate 3 pv g1f3"
          echo "bestmove e2e4"
          ;;
      esac
      ;;
    stop) echo "bestmove e7e5" ;;
    quit) exit 0 ;;
  esac
done
"#;

    #[cfg(unix)]
    fn scripted_engine_path() -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!("scripted_uci_{}.sh", std::process::id()));
        std::fs::write(&path, SCRIPTED_ENGINE).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_stops_search_and_session_recovers() {
        const WHITE_TO_MOVE: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        const BLACK_TO_MOVE: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

        let path = scripted_engine_path();
        let options = EngineOptions { threads: 1, hash_mb: 16 };
        let mut engine = StockfishEngine::new(path.to_str().unwrap(), &options)
            .await
            .unwrap();
        let request = AnalysisRequest {
            multipv: 3,
            movetime: Duration::from_millis(50),
            grace: Duration::from_millis(200),
        };

        let fast = engine.analyse(WHITE_TO_MOVE, &request).await.unwrap();
        let scores: Vec<(Option<i32>, Option<i32>)> = fast.iter().map(|l| (l.cp, l.mate)).collect();
        assert_eq!(scores, vec![(Some(30), None), (Some(20), None), (None, Some(3))]);
        assert_eq!(fast[0].pv, vec!["e2e4", "e7e5"]);

        let slow = engine.analyse(BLACK_TO_MOVE, &request).await;
        match slow {
            Err(MinerError::Timeout(budget)) => assert_eq!(budget, Duration::from_millis(250)),
            other => panic!("expected a timeout, got {other:?}"),
        }

        // The stopped search was drained, so the next answer is not stale
        let after = engine.analyse(WHITE_TO_MOVE, &request).await.unwrap();
        assert_eq!(after.len(), 3);
        assert_eq!(after[0].cp, Some(30));

        engine.quit().await;
        let _ = std::fs::remove_file(path);
    }
}
