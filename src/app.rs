//! The application orchestrator: owns the spec tree, drives the composer
//! stages in their fixed order and manages the helper lifecycle.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::appconfig::{self, AppConfig, DEFAULT_RUNTIME_REF};
use crate::compose::{params, Composer};
use crate::container::Container;
use crate::error::{Error, Result};
use crate::launch::{self, Helper, DEFAULT_HELPER_PATH};
use crate::package::{PackageInfo, Ref};
use crate::repo::{FlatpakAdapter, Repo};
use crate::spec::{Process, Runtime};
use crate::utils;

pub const DBUS_PROXY_PATH: &str = "/usr/bin/ll-dbus-proxy";

/// What `start` does once the helper is running. The spec stream and the
/// exec channel share one socket, so a blocking start cannot also accept
/// exec injections; interactive runs keep the channel and reap the helper
/// in a separate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// Stream the spec, wait for the helper, return its exit code.
    #[default]
    Block,
    /// Return right after the spec frame is written; `exec` may inject
    /// commands until `wait` or `shutdown`.
    Interactive,
}

pub struct App {
    config: AppConfig,
    package_ref: Ref,
    spec: Runtime,
    container: Container,
    repo: Box<dyn Repo>,
    flatpak_adapter: Option<Box<dyn FlatpakAdapter>>,
    desktop_exec: Option<String>,
    env_map: BTreeMap<String, String>,
    run_params: BTreeMap<String, String>,
    wait_mode: WaitMode,
    helper_path: PathBuf,
    helper: Option<Helper>,
    proxy_socket: Option<PathBuf>,
    prepared: bool,
}

impl App {
    /// Materialize the per-user config for `app_ref` and build an app
    /// ready to `start`.
    pub fn load(repo: Box<dyn Repo>, app_ref: &Ref, desktop_exec: Option<&str>) -> Result<Self> {
        Self::load_inner(repo, app_ref, desktop_exec, None)
    }

    /// Like [`App::load`] for a Flatpak-backed app; layer and desktop
    /// file paths resolve through the adapter.
    pub fn load_flatpak(
        repo: Box<dyn Repo>,
        app_ref: &Ref,
        desktop_exec: Option<&str>,
        adapter: Box<dyn FlatpakAdapter>,
    ) -> Result<Self> {
        Self::load_inner(repo, app_ref, desktop_exec, Some(adapter))
    }

    fn load_inner(
        repo: Box<dyn Repo>,
        app_ref: &Ref,
        desktop_exec: Option<&str>,
        flatpak_adapter: Option<Box<dyn FlatpakAdapter>>,
    ) -> Result<Self> {
        let config_path = appconfig::materialize(
            repo.as_ref(),
            &app_ref.app_id,
            &app_ref.version,
            flatpak_adapter.is_some(),
        )?;
        let config = AppConfig::load(&config_path)?;
        tracing::debug!(path = ?config_path, "loaded app config");

        let package_ref = Ref::parse(&config.package.reference)?;
        let spec = Runtime::base()?;
        let container = Container::create()?;

        Ok(Self {
            config,
            package_ref,
            spec,
            container,
            repo,
            flatpak_adapter,
            desktop_exec: desktop_exec
                .filter(|exec| !exec.is_empty())
                .map(str::to_string),
            env_map: BTreeMap::new(),
            run_params: BTreeMap::new(),
            wait_mode: WaitMode::default(),
            helper_path: PathBuf::from(DEFAULT_HELPER_PATH),
            helper: None,
            proxy_socket: None,
            prepared: false,
        })
    }

    /// Record user-supplied `K=V` env entries consulted during env
    /// composition. Later entries win on duplicate keys.
    pub fn save_user_env(&mut self, env_list: &[String]) {
        for entry in env_list {
            if let Some((key, value)) = entry.split_once('=') {
                self.env_map.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Run parameters from the caller, e.g. dbus proxy filters.
    pub fn set_run_params(&mut self, params: BTreeMap<String, String>) {
        self.run_params = params;
    }

    pub fn set_wait_mode(&mut self, mode: WaitMode) {
        self.wait_mode = mode;
    }

    pub fn set_helper_path(&mut self, path: impl Into<PathBuf>) {
        self.helper_path = path.into();
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn spec(&self) -> &Runtime {
        &self.spec
    }

    fn runtime_ref(&self) -> Result<Ref> {
        match &self.config.runtime {
            Some(runtime) => Ref::parse(&runtime.reference),
            None => Ref::parse(DEFAULT_RUNTIME_REF),
        }
        .map_err(Error::from)
    }

    /// Compose the full runtime spec. Stages run in a fixed order: the
    /// rootfs stage picks the mount target list, host and user mounts may
    /// override identity mounts of earlier stages, and the fixups must
    /// see everything else.
    pub fn prepare(&mut self) -> Result<()> {
        if self.prepared {
            return Ok(());
        }

        self.spec.root.path = self.container.root_path();
        utils::ensure_dir(&self.spec.root.path)?;

        let runtime_ref = self.runtime_ref()?;
        let mut runtime_root = self.repo.root_of_layer(&runtime_ref)?;
        // layers built from newer tooling keep their content under files/
        let files_root = runtime_root.join("files");
        if files_root.is_dir() {
            runtime_root = files_root;
        }

        let app_root = self.repo.root_of_layer(&self.package_ref)?;
        let descriptor_path = app_root.join("info.json");
        let info = if descriptor_path.is_file() {
            Some(PackageInfo::load(&descriptor_path)?)
        } else {
            None
        };

        let mut proxy_requested = !self.run_params.contains_key(params::NO_DBUS_PROXY);
        if proxy_requested && !Path::new(DBUS_PROXY_PATH).is_file() {
            tracing::warn!("dbus proxy binary is not installed, falling back to direct bus access");
            proxy_requested = false;
        }
        let proxy_socket = if proxy_requested {
            let path = utils::create_proxy_socket("session-bus-proxy-")?;
            // the proxy binds the path itself, leave only the name behind
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::io("failed to unlink proxy socket", &path)(err)),
            }
            Some(path)
        } else {
            None
        };

        let mut composer = Composer::new(
            &mut self.spec,
            &self.container,
            &self.package_ref,
            app_root,
            runtime_root,
            &self.env_map,
            &self.run_params,
            self.flatpak_adapter.as_deref(),
        );

        composer.stage_rootfs(info.as_ref())?;
        composer.stage_system()?;
        composer.stage_host()?;
        composer.stage_user()?;
        composer.stage_mount(self.config.permissions.as_ref())?;
        composer.fix_mount()?;
        composer.write_env_file()?;
        composer.resolve_exec(self.desktop_exec.as_deref())?;
        composer.stage_dbus_proxy(proxy_socket.as_deref())?;
        composer.stage_dbus_proxy_args(proxy_requested, proxy_socket.as_deref())?;

        self.proxy_socket = proxy_socket;
        self.prepared = true;
        Ok(())
    }

    /// Launch the sandbox. In `Block` mode this returns the helper's exit
    /// code after teardown; in `Interactive` mode it returns `0` once the
    /// spec has been streamed.
    pub fn start(&mut self) -> Result<i32> {
        self.prepare()?;

        let pid_path = self
            .container
            .working_directory
            .join(format!("{}.pid", std::process::id()));
        fs::write(&pid_path, b"").map_err(Error::io("failed to write pid file", &pid_path))?;

        tracing::debug!(root = ?self.spec.root.path, "starting container");
        let helper = launch::spawn(&self.helper_path, &self.spec)?;
        self.container.pid = Some(helper.pid);

        match self.wait_mode {
            WaitMode::Block => {
                let code = launch::wait(helper.pid)?;
                drop(helper);
                self.teardown();
                Ok(code)
            }
            WaitMode::Interactive => {
                self.helper = Some(helper);
                Ok(0)
            }
        }
    }

    /// Inject a command into the running container. `cmd` undergoes
    /// shell-style word splitting, `env` is a comma-separated `K=V` list.
    pub fn exec(&mut self, cmd: &str, env: &str, cwd: &str) -> Result<()> {
        if self.wait_mode != WaitMode::Interactive {
            return Err(Error::NotInteractive);
        }
        let helper = self.helper.as_mut().ok_or(Error::NotStarted)?;

        let args = match shell_words::split(cmd) {
            Ok(args) => args,
            Err(err) => {
                tracing::warn!(?err, cmd, "failed to split exec command");
                Vec::new()
            }
        };
        let env = env
            .split(',')
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();

        let process = Process {
            cwd: Some(PathBuf::from(cwd)),
            env,
            args,
        };
        helper.channel.send(&process)?;
        Ok(())
    }

    /// Wait for an interactively started helper and tear the run down.
    pub fn wait(&mut self) -> Result<i32> {
        let helper = self.helper.take().ok_or(Error::NotStarted)?;
        let pid = helper.pid;
        // closing the channel tells the helper no more commands follow
        drop(helper);
        let code = launch::wait(pid)?;
        self.teardown();
        Ok(code)
    }

    /// Terminate an interactively started helper with `SIGTERM`, reap it
    /// and tear the run down.
    pub fn shutdown(&mut self) -> Result<i32> {
        let helper = self.helper.take().ok_or(Error::NotStarted)?;
        let pid = helper.pid;
        drop(helper);
        let code = launch::terminate(pid)?;
        self.teardown();
        Ok(code)
    }

    fn teardown(&mut self) {
        if let Some(path) = self.proxy_socket.take() {
            if let Err(err) = fs::remove_file(&path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(?err, ?path, "failed to remove proxy socket");
                }
            }
        }
        self.container.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Arch;
    use anyhow::Result;
    use serial_test::serial;
    use std::collections::BTreeSet;
    use std::os::unix::fs::PermissionsExt;

    struct TestEnv {
        _home: tempfile::TempDir,
        _root: tempfile::TempDir,
        layers: PathBuf,
    }

    fn setup() -> Result<TestEnv> {
        let home = tempfile::tempdir()?;
        let root = tempfile::tempdir()?;
        std::env::set_var("HOME", home.path());
        std::env::set_var("LINGLONG_ROOT", root.path());
        std::env::set_var("XDG_RUNTIME_DIR", home.path());
        std::env::remove_var("XAUTHORITY");

        let layers = root.path().join("layers");
        fs::create_dir_all(&layers)?;
        Ok(TestEnv {
            _home: home,
            _root: root,
            layers,
        })
    }

    struct LayerRepo {
        layers: PathBuf,
        arch: Arch,
    }

    impl Repo for LayerRepo {
        fn root_of_layer(&self, r: &Ref) -> crate::error::Result<PathBuf> {
            let path = self.layers.join(&r.app_id);
            if path.is_dir() {
                Ok(path)
            } else {
                Err(Error::LayerNotFound(r.to_local_string()))
            }
        }

        fn latest_of_ref(&self, app_id: &str, version: &str) -> crate::error::Result<Ref> {
            Ok(Ref::new(app_id, version, self.arch))
        }
    }

    fn write_app_layer(layers: &Path, app_id: &str, runtime: &str, exec: &str) -> Result<()> {
        let app = layers.join(app_id);
        fs::create_dir_all(app.join("entries/applications"))?;
        fs::write(
            app.join("info.json"),
            format!(r#"{{"appid":"{app_id}","runtime":"{runtime}"}}"#),
        )?;
        if !exec.is_empty() {
            fs::write(
                app.join("entries/applications/app.desktop"),
                format!("[Desktop Entry]\nName=App\nExec={exec}\nType=Application\n"),
            )?;
        }
        Ok(())
    }

    fn write_runtime_layer(layers: &Path, runtime_id: &str) -> Result<PathBuf> {
        let files = layers.join(runtime_id).join("files");
        fs::create_dir_all(files.join("bin"))?;
        Ok(files)
    }

    fn load_app(env: &TestEnv, app_id: &str, arch: Arch, desktop_exec: Option<&str>) -> Result<App> {
        let repo = Box::new(LayerRepo {
            layers: env.layers.clone(),
            arch,
        });
        let app_ref = Ref::new(app_id, "1.0.0", arch);
        Ok(App::load(repo, &app_ref, desktop_exec)?)
    }

    #[test]
    #[serial]
    fn test_prepare_thin_runtime_without_proxy() -> Result<()> {
        let env = setup()?;
        let runtime_files = write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "app %U",
        )?;

        let mut app = load_app(&env, "org.example.App", Arch::X86_64, None)?;
        app.prepare()?;

        let spec = app.spec();
        assert_eq!(spec.process.args, vec!["app"]);

        let library_path = spec.process.env_value("LD_LIBRARY_PATH").unwrap();
        assert!(library_path.ends_with("/runtime/lib/i386-linux-gnu"));
        let path = spec.process.env_value("PATH").unwrap();
        assert!(path.starts_with("/opt/apps/org.example.App/files/bin:/runtime/bin:"));

        let annotations = spec.annotations.as_ref().unwrap();
        assert!(annotations.native.is_some());
        assert!(annotations.overlayfs.is_none());
        // without the proxy binary installed the request degrades
        assert!(!annotations.dbus_proxy_info.as_ref().unwrap().enable);

        // the runtime layer content under files/ wins over the layer root
        assert!(annotations
            .native
            .as_ref()
            .unwrap()
            .mounts
            .iter()
            .any(|m| m.destination == Path::new("/runtime") && m.source == runtime_files));

        // each env key appears exactly once
        let mut keys = BTreeSet::new();
        for entry in &spec.process.env {
            let key = entry.split('=').next().unwrap().to_string();
            assert!(keys.insert(key), "duplicate env key in {entry}");
        }

        // the composed env lands in the env file, bound into the sandbox
        let env_file = fs::read_to_string(app.container().working_directory.join("env"))?;
        let file_lines: Vec<&str> = env_file.lines().collect();
        assert_eq!(file_lines, spec.process.env.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(spec
            .mounts
            .iter()
            .any(|m| m.destination == Path::new("/run/app/env")));

        // no-proxy mode binds the real session bus
        let bus = PathBuf::from(format!("/run/user/{}/bus", nix::unistd::getuid().as_raw()));
        assert!(spec
            .mounts
            .iter()
            .any(|m| m.destination == bus && m.source == bus));

        for mount in &spec.mounts {
            assert!(mount.destination.is_absolute());
        }

        // the id maps cover exactly the calling user
        assert_eq!(spec.linux.uid_mappings.len(), 1);
        assert_eq!(spec.linux.uid_mappings[0].container_id, 0);
        assert_eq!(spec.linux.uid_mappings[0].size, 1);
        assert_eq!(spec.linux.gid_mappings.len(), 1);

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_prepare_arm64_runtime_env() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/arm64",
            "app",
        )?;

        let mut app = load_app(&env, "org.example.App", Arch::Arm64, None)?;
        app.prepare()?;

        let qt_plugin_path = app.spec().process.env_value("QT_PLUGIN_PATH").unwrap();
        assert!(qt_plugin_path.contains("/runtime/lib/aarch64-linux-gnu/qt5/plugins"));

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_prepare_wine_runtime_overlay() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.deepin.Wine")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.deepin.Wine/6.0.0/x86_64",
            "app",
        )?;

        let mut app = load_app(&env, "org.example.App", Arch::X86_64, None)?;
        app.prepare()?;

        let workdir = app.container().working_directory.clone();
        let annotations = app.spec().annotations.as_ref().unwrap();
        let overlay = annotations.overlayfs.as_ref().unwrap();
        assert_eq!(overlay.lower_parent, workdir.join(".overlayfs/lower_parent"));
        assert_eq!(overlay.upper, workdir.join(".overlayfs/upper"));
        assert_eq!(overlay.workdir, workdir.join(".overlayfs/workdir"));
        assert!(overlay
            .mounts
            .iter()
            .any(|m| m.destination == Path::new("/opt/deepinwine")));

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_prepare_360_browser_quirk() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "com.360.browser-stable",
            "org.test.Runtime/1.0.0/x86_64",
            "browser",
        )?;

        let mut app = load_app(&env, "com.360.browser-stable", Arch::X86_64, None)?;
        app.prepare()?;

        let quirk = app
            .spec()
            .mounts
            .iter()
            .find(|m| m.destination == Path::new("/apps-data/private/com.360.browser-stable"))
            .unwrap();
        assert_eq!(quirk.options, vec!["rw", "rbind"]);
        assert!(quirk.source.is_dir());

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_prepare_unknown_arch_fails() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "app",
        )?;

        let mut app = load_app(&env, "org.example.App", Arch::Unknown, None)?;
        let err = app.prepare().unwrap_err();
        assert!(matches!(err, Error::UnsupportedArch(_)));

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_prepare_without_desktop_entry_fails() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "",
        )?;

        let mut app = load_app(&env, "org.example.App", Arch::X86_64, None)?;
        let err = app.prepare().unwrap_err();
        assert!(matches!(err, Error::NoDesktopEntry(_)));

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_exec_wrapper_args_are_skipped() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "ll-cli run org.example.App --exec app --flag",
        )?;

        let mut app = load_app(&env, "org.example.App", Arch::X86_64, None)?;
        app.prepare()?;
        assert_eq!(app.spec().process.args, vec!["app", "--flag"]);

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_legacy_outputs_layout_keeps_raw_exec() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "app --flag %F",
        )?;
        fs::create_dir_all(env.layers.join("org.example.App/outputs/share"))?;

        let mut app = load_app(&env, "org.example.App", Arch::X86_64, None)?;
        app.prepare()?;
        assert_eq!(app.spec().process.args, vec!["app", "--flag"]);

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_desktop_env_directive_updates_env() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "env LANG=zh_CN.UTF-8 app %F",
        )?;

        let mut app = load_app(&env, "org.example.App", Arch::X86_64, None)?;
        app.prepare()?;

        assert_eq!(app.spec().process.args, vec!["app"]);
        assert_eq!(app.spec().process.env_value("LANG"), Some("zh_CN.UTF-8"));

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_desktop_exec_override_wins() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "app",
        )?;

        let mut app = load_app(
            &env,
            "org.example.App",
            Arch::X86_64,
            Some("custom --debug"),
        )?;
        app.prepare()?;
        assert_eq!(app.spec().process.args, vec!["custom", "--debug"]);

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_user_env_allow_list() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "app",
        )?;

        let mut app = load_app(&env, "org.example.App", Arch::X86_64, None)?;
        app.save_user_env(&[
            "DISPLAY=:0".to_string(),
            "LD_PRELOAD=/evil.so".to_string(),
            "PATH=/custom/bin".to_string(),
        ]);
        app.prepare()?;

        let spec = app.spec();
        assert_eq!(spec.process.env_value("DISPLAY"), Some(":0"));
        assert_eq!(spec.process.env_value("LD_PRELOAD"), None);
        assert_eq!(
            spec.process.env_value("PATH"),
            Some("/opt/apps/org.example.App/files/bin:/runtime/bin:/custom/bin")
        );

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_exec_requires_interactive_mode() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "app",
        )?;

        let mut app = load_app(&env, "org.example.App", Arch::X86_64, None)?;
        let err = app.exec("echo hi", "", "/tmp").unwrap_err();
        assert!(matches!(err, Error::NotInteractive));

        app.set_wait_mode(WaitMode::Interactive);
        let err = app.exec("echo hi", "", "/tmp").unwrap_err();
        assert!(matches!(err, Error::NotStarted));

        app.container().cleanup();
        Ok(())
    }

    #[test]
    #[serial]
    fn test_interactive_start_and_exec_injection() -> Result<()> {
        let env = setup()?;
        write_runtime_layer(&env.layers, "org.test.Runtime")?;
        write_app_layer(
            &env.layers,
            "org.example.App",
            "org.test.Runtime/1.0.0/x86_64",
            "app",
        )?;

        // a stand-in helper that copies every frame it receives to a file
        let capture = env.layers.join("frames");
        std::env::set_var("HELPER_CAPTURE", &capture);
        let helper_path = env.layers.join("fake-helper");
        fs::write(
            &helper_path,
            "#!/bin/sh\neval \"exec 3<&$1\"\ncat <&3 > \"$HELPER_CAPTURE\"\nexit 0\n",
        )?;
        fs::set_permissions(&helper_path, fs::Permissions::from_mode(0o755))?;

        let mut app = load_app(&env, "org.example.App", Arch::X86_64, None)?;
        app.set_wait_mode(WaitMode::Interactive);
        app.set_helper_path(&helper_path);

        assert_eq!(app.start()?, 0);
        app.exec("echo hi", "A=1", "/tmp")?;
        assert_eq!(app.wait()?, 0);

        let captured = fs::read(&capture)?;
        let frames: Vec<&[u8]> = captured
            .split(|byte| *byte == 0)
            .filter(|frame| !frame.is_empty())
            .collect();
        assert_eq!(frames.len(), 2);

        let spec: Runtime = serde_json::from_slice(frames[0])?;
        assert_eq!(spec.process.args, vec!["app"]);

        let injected: Process = serde_json::from_slice(frames[1])?;
        assert_eq!(injected.args, vec!["echo", "hi"]);
        assert_eq!(injected.env, vec!["A=1"]);
        assert_eq!(injected.cwd, Some(PathBuf::from("/tmp")));

        // teardown removed the workdir
        assert!(!app.container().working_directory.exists());
        std::env::remove_var("HELPER_CAPTURE");
        Ok(())
    }
}
