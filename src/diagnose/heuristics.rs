//! Misconfiguration heuristics
//!
//! A heuristic is a check over a [`ContainerSnapshot`] plus the remedies to
//! suggest when it fires. Checks are either plain predicates or regexes run
//! against the fetched log tail.

use super::ContainerSnapshot;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

/// Restarts at or above this count are reported as a crash loop
pub const RESTART_LOOP_THRESHOLD: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub code: String,
    pub finding: String,
    pub remedies: Vec<String>,
}

#[derive(Clone, Copy)]
pub enum Check {
    /// Returns the finding when the heuristic fires
    Predicate(fn(&ContainerSnapshot) -> Option<String>),
    /// Case-insensitive pattern matched line by line against the log tail
    LogPattern(&'static str),
}

#[derive(Clone, Copy)]
pub struct Heuristic {
    pub code: &'static str,
    pub check: Check,
    pub remedies: fn(&ContainerSnapshot) -> Vec<String>,
}

impl Heuristic {
    pub fn evaluate(&self, snapshot: &ContainerSnapshot) -> Option<Diagnosis> {
        let finding = match self.check {
            Check::Predicate(predicate) => predicate(snapshot)?,
            Check::LogPattern(pattern) => {
                let regex = match Regex::new(&format!("(?i){}", pattern)) {
                    Ok(regex) => regex,
                    Err(e) => {
                        warn!(code = self.code, error = %e, "Skipping heuristic with invalid pattern");
                        return None;
                    }
                };
                let line = snapshot.log_tail.iter().find(|l| regex.is_match(l))?;
                format!("Log line matched: {}", line.trim())
            }
        };

        Some(Diagnosis {
            code: self.code.to_string(),
            finding,
            remedies: (self.remedies)(snapshot),
        })
    }
}

/// Built-in heuristics in reporting order
pub fn builtin() -> Vec<Heuristic> {
    vec![
        Heuristic {
            code: "not-running",
            check: Check::Predicate(|s| {
                (!s.is_running()).then(|| format!("Container is {}, not running", s.status))
            }),
            remedies: |s| {
                vec![
                    format!("docker logs {}", s.name),
                    format!("docker restart {}", s.name),
                ]
            },
        },
        Heuristic {
            code: "no-port-bindings",
            check: Check::Predicate(|s| {
                s.ports.is_empty().then(|| {
                    "No host port bindings configured; the service is unreachable from the host"
                        .to_string()
                })
            }),
            remedies: |s| {
                let port = s
                    .exposed_ports
                    .first()
                    .map(|p| p.split('/').next().unwrap_or(p).to_string())
                    .unwrap_or_else(|| "<port>".to_string());
                vec![
                    format!("Add a ports entry such as \"{0}:{0}\" to docker-compose.yml", port),
                    format!("docker run -p {0}:{0} {1}", port, s.image),
                ]
            },
        },
        Heuristic {
            code: "exposed-unbound",
            check: Check::Predicate(|s| {
                if s.ports.is_empty() {
                    return None;
                }
                let unbound: Vec<&str> = s
                    .exposed_ports
                    .iter()
                    .filter(|p| !s.ports.contains_key(*p))
                    .map(String::as_str)
                    .collect();
                (!unbound.is_empty())
                    .then(|| format!("Exposed but not published: {}", unbound.join(", ")))
            }),
            remedies: |_| vec!["Publish the missing ports or drop the EXPOSE lines".to_string()],
        },
        Heuristic {
            code: "oom-killed",
            check: Check::Predicate(|s| {
                s.oom_killed
                    .then(|| "The kernel killed the container for exceeding its memory limit".to_string())
            }),
            remedies: |s| {
                vec![
                    format!("docker stats {}", s.name),
                    "Raise the memory limit (deploy.resources.limits.memory) or reduce usage"
                        .to_string(),
                ]
            },
        },
        Heuristic {
            code: "non-zero-exit",
            check: Check::Predicate(|s| match s.exit_code {
                Some(code) if code != 0 && !s.is_running() => {
                    Some(format!("Main process exited with code {}", code))
                }
                _ => None,
            }),
            remedies: |s| vec![format!("docker logs --tail 100 {}", s.name)],
        },
        Heuristic {
            code: "restart-loop",
            check: Check::Predicate(|s| {
                (s.restart_count >= RESTART_LOOP_THRESHOLD)
                    .then(|| format!("Restarted {} times", s.restart_count))
            }),
            remedies: |s| {
                vec![
                    format!("docker logs --tail 100 {}", s.name),
                    "Check the entrypoint and required environment variables".to_string(),
                ]
            },
        },
        Heuristic {
            code: "port-in-use",
            check: Check::LogPattern(r"EADDRINUSE|address already in use|port is already allocated"),
            remedies: |_| {
                vec![
                    "Find the process holding the port: ss -ltnp".to_string(),
                    "Change the published host port in docker-compose.yml".to_string(),
                ]
            },
        },
        Heuristic {
            code: "connection-refused",
            check: Check::LogPattern(r"ECONNREFUSED|connection refused"),
            remedies: |_| {
                vec![
                    "Point the app at the service name (e.g. db:5432), not localhost".to_string(),
                    "Verify the dependency container is running: docker ps".to_string(),
                ]
            },
        },
        Heuristic {
            code: "permission-denied",
            check: Check::LogPattern(r"EACCES|permission denied"),
            remedies: |_| {
                vec![
                    "Check file ownership of mounted volumes and the USER in the Dockerfile"
                        .to_string(),
                ]
            },
        },
    ]
}

pub fn run_all(snapshot: &ContainerSnapshot, heuristics: &[Heuristic]) -> Vec<Diagnosis> {
    heuristics
        .iter()
        .filter_map(|h| h.evaluate(snapshot))
        .collect()
}
