//! Lecteur de ressources Servo.
//!
//! Servo a besoin d'un ensemble de fichiers de ressources (préférences,
//! certificats, domaines publics, etc.). L'embedder fournit une
//! implémentation de `ResourceReaderMethods` enregistrée via
//! `servo::resources::set()`.
//!
//! Le dossier `resources/` est cherché dans l'ordre :
//! 1. Variable d'environnement `SERVO_RESOURCES_PATH`
//! 2. À côté de l'exécutable, ou à la racine du projet si l'exécutable est
//!    dans `target/{debug,release}/`
//! 3. Dans le répertoire courant

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::{env, fs};

use servo::resources::{self, Resource};
use tracing::{error, info};

use crate::error::ShellError;

const RESOURCES_ENV_VAR: &str = "SERVO_RESOURCES_PATH";

/// Dossier résolu une fois par [`init`].
static RESOURCES_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Résout le dossier de ressources et installe le lecteur.
///
/// **Doit être appelé avant `ServoBuilder::build()`**.
pub fn init() -> Result<PathBuf, ShellError> {
    let candidates = candidate_dirs(
        env::var_os(RESOURCES_ENV_VAR).map(PathBuf::from),
        env::current_exe().ok().and_then(|p| p.canonicalize().ok()),
        env::current_dir().ok(),
    );
    let dir = candidates
        .into_iter()
        .find(|p| p.is_dir())
        .ok_or(ShellError::ResourcesNotFound)?;

    info!(path = %dir.display(), "Servo resources directory");
    *RESOURCES_DIR.lock().unwrap_or_else(PoisonError::into_inner) = Some(dir.clone());
    resources::set(Box::new(ResourceReader));
    Ok(dir)
}

fn resources_dir() -> Option<PathBuf> {
    RESOURCES_DIR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

struct ResourceReader;

impl resources::ResourceReaderMethods for ResourceReader {
    fn read(&self, file: Resource) -> Vec<u8> {
        let Some(dir) = resources_dir() else {
            error!(file = file.filename(), "Resource reader used before init");
            return Vec::new();
        };
        let Some(path) = resolve_within(&dir, file.filename()) else {
            error!(file = file.filename(), dir = %dir.display(), "Servo resource not found");
            return Vec::new();
        };
        fs::read(&path).unwrap_or_else(|e| {
            error!(path = %path.display(), error = %e, "Impossible de lire la ressource Servo");
            Vec::new()
        })
    }

    fn sandbox_access_files_dirs(&self) -> Vec<PathBuf> {
        resources_dir().into_iter().collect()
    }

    fn sandbox_access_files(&self) -> Vec<PathBuf> {
        vec![]
    }
}

/// Ordre de recherche, sans vérifier l'existence.
fn candidate_dirs(
    env_override: Option<PathBuf>,
    exe: Option<PathBuf>,
    cwd: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    dirs.extend(env_override);

    if let Some(exe_dir) = exe.as_deref().and_then(Path::parent) {
        dirs.push(exe_dir.join("resources"));

        // Pendant le développement : target/{debug,release}/ → racine du projet.
        if let Some(target_dir) = exe_dir.parent()
            && target_dir.file_name().is_some_and(|n| n == "target")
            && let Some(project_root) = target_dir.parent()
        {
            dirs.push(project_root.join("resources"));
        }
    }

    if let Some(cwd) = cwd {
        dirs.push(cwd.join("resources"));
    }
    dirs
}

/// Chemin canonique de `file` s'il existe et reste sous `dir`.
fn resolve_within(dir: &Path, file: &str) -> Option<PathBuf> {
    let root = dir.canonicalize().ok()?;
    let path = root.join(file).canonicalize().ok()?;
    path.starts_with(&root).then_some(path)
}
