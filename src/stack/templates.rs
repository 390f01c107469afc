//! Build recipe and run manifest rendering
//!
//! Each [`StackKind`] maps to one [`RecipeTemplate`]. Rendering is a pure
//! function of the [`StackProfile`]: no timestamps, no environment lookups,
//! so the same profile always yields byte-identical artifacts.

use super::{StackKind, StackProfile};
use std::fmt::Write;

pub const BUILD_RECIPE_FILE: &str = "Dockerfile";
pub const RUN_MANIFEST_FILE: &str = "docker-compose.yml";

/// Service name used in the run manifest and by the local deploy step
pub const SERVICE_NAME: &str = "app";

/// Image variable the compose file reads; the deploy step sets it
pub const IMAGE_VARIABLE: &str = "APP_IMAGE";

/// Two-stage recipe shape for one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeTemplate {
    pub build_image: String,
    pub runtime_image: String,
    /// Manifests copied before dependency install, for layer caching
    pub dependency_files: Vec<String>,
    pub build_commands: Vec<String>,
    pub runtime_commands: Vec<String>,
    /// `(builder path, runtime path)` pairs copied across stages
    pub artifacts: Vec<(String, String)>,
    pub cmd: Vec<String>,
}

impl RecipeTemplate {
    pub fn for_profile(profile: &StackProfile) -> Option<Self> {
        let entrypoint = profile.entrypoint();
        match profile.kind() {
            StackKind::NodePrisma => {
                let cmd = script_command("node", entrypoint, &[".js", ".mjs", ".cjs"]);
                let mut artifacts = vec![
                    ("/app/package*.json".to_string(), "./".to_string()),
                    ("/app/node_modules".to_string(), "./node_modules".to_string()),
                    ("/app/prisma".to_string(), "./prisma".to_string()),
                ];
                artifacts.push(match output_root(entrypoint) {
                    Some(root) => (format!("/app/{}", root), format!("./{}", root)),
                    None => ("/app".to_string(), "./".to_string()),
                });
                artifacts.dedup();

                Some(RecipeTemplate {
                    build_image: "node:20".to_string(),
                    runtime_image: "node:20-slim".to_string(),
                    dependency_files: vec!["package*.json".to_string(), "prisma".to_string()],
                    build_commands: vec![
                        "npm ci".to_string(),
                        "npx prisma generate".to_string(),
                        "npm run build".to_string(),
                        "npm prune --omit=dev".to_string(),
                    ],
                    runtime_commands: vec![
                        "apt-get update && apt-get install -y --no-install-recommends openssl \
                         && rm -rf /var/lib/apt/lists/*"
                            .to_string(),
                    ],
                    artifacts,
                    cmd,
                })
            }
            StackKind::Python => Some(RecipeTemplate {
                build_image: "python:3.12".to_string(),
                runtime_image: "python:3.12-slim".to_string(),
                dependency_files: vec!["requirements.txt".to_string()],
                build_commands: vec![
                    "pip install --no-cache-dir --prefix=/install -r requirements.txt".to_string(),
                ],
                runtime_commands: vec![],
                artifacts: vec![
                    ("/install".to_string(), "/usr/local".to_string()),
                    ("/app".to_string(), "./".to_string()),
                ],
                cmd: script_command("python", entrypoint, &[".py"]),
            }),
            StackKind::React => Some(RecipeTemplate {
                build_image: "node:20".to_string(),
                runtime_image: "nginx:1.27-alpine".to_string(),
                dependency_files: vec!["package*.json".to_string()],
                build_commands: vec!["npm ci".to_string(), "npm run build".to_string()],
                runtime_commands: vec![format!(
                    "sed -i -E 's/listen( +)80;/listen\\1{};/' /etc/nginx/conf.d/default.conf",
                    profile.port()
                )],
                artifacts: vec![(
                    format!("/app/{}", entrypoint.trim_end_matches('/')),
                    "/usr/share/nginx/html".to_string(),
                )],
                cmd: vec!["nginx".to_string(), "-g".to_string(), "daemon off;".to_string()],
            }),
            StackKind::Generic => None,
        }
    }
}

/// `["node", "dist/server.js"]` for a script path, else the entrypoint split
/// on whitespace (`npm start` -> `["npm", "start"]`)
fn script_command(interpreter: &str, entrypoint: &str, extensions: &[&str]) -> Vec<String> {
    let is_script = !entrypoint.contains(char::is_whitespace)
        && extensions.iter().any(|ext| entrypoint.ends_with(ext));
    if is_script {
        vec![interpreter.to_string(), entrypoint.to_string()]
    } else {
        entrypoint.split_whitespace().map(str::to_string).collect()
    }
}

/// First path component of a script entrypoint (`dist/server.js` -> `dist`)
fn output_root(entrypoint: &str) -> Option<&str> {
    if entrypoint.contains(char::is_whitespace) {
        return None;
    }
    let trimmed = entrypoint.trim_start_matches("./");
    trimmed.split_once('/').map(|(root, _)| root).or(Some(trimmed))
}

/// Exec-form array with no spaces between elements
fn exec_form(argv: &[String]) -> String {
    serde_json::Value::from(argv.to_vec()).to_string()
}

pub fn render_build_recipe(profile: &StackProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Build recipe for the {} stack", profile.kind());

    let Some(template) = RecipeTemplate::for_profile(profile) else {
        render_placeholder(&mut out, profile);
        return out;
    };

    let (env_key, env_value) = profile.kind().production_env();

    let _ = writeln!(out);
    let _ = writeln!(out, "FROM {} AS builder", template.build_image);
    let _ = writeln!(out, "WORKDIR /app");
    for file in &template.dependency_files {
        let target = if file.contains('*') || file.contains('.') {
            "./".to_string()
        } else {
            format!("./{}", file)
        };
        let _ = writeln!(out, "COPY {} {}", file, target);
    }
    if profile.kind() == StackKind::React {
        // bundlers read this at build time
        let _ = writeln!(out, "ENV {}={}", env_key, env_value);
    }
    let mut commands = template.build_commands.iter();
    if let Some(install) = commands.next() {
        let _ = writeln!(out, "RUN {}", install);
    }
    let _ = writeln!(out, "COPY . .");
    for command in commands {
        let _ = writeln!(out, "RUN {}", command);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "FROM {}", template.runtime_image);
    for command in &template.runtime_commands {
        let _ = writeln!(out, "RUN {}", command);
    }
    if profile.kind() != StackKind::React {
        let _ = writeln!(out, "WORKDIR /app");
        let _ = writeln!(out, "ENV {}={}", env_key, env_value);
    }
    for (from, to) in &template.artifacts {
        let _ = writeln!(out, "COPY --from=builder {} {}", from, to);
    }
    let _ = writeln!(out, "EXPOSE {}", profile.port());
    let _ = writeln!(out, "CMD {}", exec_form(&template.cmd));
    out
}

fn render_placeholder(out: &mut String, profile: &StackProfile) {
    let (env_key, env_value) = profile.kind().production_env();
    let cmd = if profile.entrypoint().is_empty() {
        vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo 'Set CMD to the command that starts your application' >&2; exit 1".to_string(),
        ]
    } else {
        profile
            .entrypoint()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    };

    let _ = writeln!(out, "# Placeholder: adjust the base image and start command");
    let _ = writeln!(out);
    let _ = writeln!(out, "FROM debian:bookworm-slim");
    let _ = writeln!(out, "WORKDIR /app");
    let _ = writeln!(out, "ENV {}={}", env_key, env_value);
    let _ = writeln!(out, "COPY . .");
    let _ = writeln!(out, "EXPOSE {}", profile.port());
    let _ = writeln!(out, "CMD {}", exec_form(&cmd));
}

pub fn render_run_manifest(profile: &StackProfile) -> String {
    let (env_key, env_value) = profile.kind().production_env();
    let mut out = String::new();
    let _ = writeln!(out, "services:");
    let _ = writeln!(out, "  {}:", SERVICE_NAME);
    let _ = writeln!(out, "    build: .");
    let _ = writeln!(out, "    image: ${{{}:-{}:latest}}", IMAGE_VARIABLE, SERVICE_NAME);
    let _ = writeln!(out, "    ports:");
    let _ = writeln!(out, "      - \"{0}:{0}\"", profile.port());
    let _ = writeln!(out, "    environment:");
    let _ = writeln!(out, "      {}: {}", env_key, env_value);
    let _ = writeln!(out, "    restart: unless-stopped");
    out
}
