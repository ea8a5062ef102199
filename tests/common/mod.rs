//! Common test utilities for cudaup integration tests
//!
//! Every test runs against a sandboxed Layout: prefix, bin, etc and work
//! directories under a tempdir, plus a stub directory prepended to PATH
//! carrying fake `nvidia-smi`, `update-alternatives` and `ldconfig`
//! binaries. Archives are real tar.gz / tar.xz files built on the fly.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

#[allow(dead_code)]
pub struct Sandbox {
    pub temp: TempDir,
    pub prefix: PathBuf,
    pub bin: PathBuf,
    pub etc: PathBuf,
    pub work: PathBuf,
    pub stubs: PathBuf,
    pub files: PathBuf,
}

#[allow(dead_code)]
impl Sandbox {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        let sandbox = Self {
            prefix: root.join("prefix"),
            bin: root.join("bin"),
            etc: root.join("etc"),
            work: root.join("work"),
            stubs: root.join("stubs"),
            files: root.join("files"),
            temp,
        };
        for dir in [
            &sandbox.prefix,
            &sandbox.bin,
            &sandbox.etc,
            &sandbox.work,
            &sandbox.stubs,
            &sandbox.files,
        ] {
            fs::create_dir_all(dir).expect("Failed to create sandbox directory");
        }
        sandbox.stub_nvidia_smi("560.35.03");
        sandbox.stub_update_alternatives();
        sandbox.stub_ldconfig();
        sandbox
    }

    /// A cudaup command wired to this sandbox's layout and stub PATH.
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cudaup").expect("cudaup binary");
        let path = format!(
            "{}:{}",
            self.stubs.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        cmd.env("CUDAUP_PREFIX", &self.prefix)
            .env("CUDAUP_BIN_DIR", &self.bin)
            .env("CUDAUP_ETC_DIR", &self.etc)
            .env("CUDAUP_WORK_DIR", &self.work)
            .env("CUDAUP_MIN_FREE_GIB", "0")
            .env("PATH", path);
        cmd
    }

    pub fn write_stub(&self, name: &str, script: &str) {
        let path = self.stubs.join(name);
        fs::write(&path, script).expect("Failed to write stub");
        make_executable(&path);
    }

    pub fn stub_nvidia_smi(&self, driver_version: &str) {
        self.write_stub(
            "nvidia-smi",
            &format!("#!/bin/sh\necho \"{driver_version}\"\n"),
        );
    }

    /// Recording stub: every invocation appends its arguments to alt.log.
    pub fn stub_update_alternatives(&self) {
        let log = self.temp.path().join("alt.log");
        self.write_stub(
            "update-alternatives",
            &format!("#!/bin/sh\necho \"$@\" >> \"{}\"\n", log.display()),
        );
    }

    pub fn stub_ldconfig(&self) {
        self.write_stub("ldconfig", "#!/bin/sh\nexit 0\n");
    }

    pub fn alternatives_log(&self) -> String {
        fs::read_to_string(self.temp.path().join("alt.log")).unwrap_or_default()
    }

    /// A fake runfile installer: creates `bin/nvcc` (reporting the given
    /// family), `include/` and `lib64/` under --toolkitpath.
    pub fn make_runfile(&self, family: &str) -> PathBuf {
        let path = self.files.join(format!("cuda_{family}_linux.run"));
        let script = format!(
            "#!/bin/sh\n\
             path=\"\"\n\
             for arg in \"$@\"; do\n\
             \tcase \"$arg\" in\n\
             \t\t--toolkitpath=*) path=\"${{arg#--toolkitpath=}}\" ;;\n\
             \tesac\n\
             done\n\
             [ -n \"$path\" ] || exit 2\n\
             mkdir -p \"$path/bin\" \"$path/include\" \"$path/lib64\"\n\
             cat > \"$path/bin/nvcc\" <<'EOF'\n\
             #!/bin/sh\n\
             echo \"nvcc: NVIDIA (R) Cuda compiler driver\"\n\
             echo \"Cuda compilation tools, release {family}, V{family}.77\"\n\
             EOF\n\
             chmod 755 \"$path/bin/nvcc\"\n"
        );
        fs::write(&path, script).expect("Failed to write runfile");
        make_executable(&path);
        path
    }

    /// A fake runfile that always fails, for installer-failure tests.
    pub fn make_failing_runfile(&self, file_name: &str) -> PathBuf {
        let path = self.files.join(file_name);
        fs::write(&path, "#!/bin/sh\necho 'installer exploded' >&2\nexit 1\n")
            .expect("Failed to write runfile");
        make_executable(&path);
        path
    }

    /// Pre-install a toolkit directly, bypassing the installer: the
    /// filesystem evidence for stage `toolkit installed`.
    pub fn install_fake_toolkit(&self, family: &str) {
        let root = self.prefix.join(format!("cuda-{family}"));
        let bin = root.join("bin");
        fs::create_dir_all(&bin).expect("Failed to create toolkit dirs");
        let nvcc = bin.join("nvcc");
        fs::write(
            &nvcc,
            format!(
                "#!/bin/sh\necho \"Cuda compilation tools, release {family}, V{family}.77\"\n"
            ),
        )
        .expect("Failed to write nvcc stub");
        make_executable(&nvcc);
    }

    /// Build a cuDNN archive with `<payload>/include/cudnn.h` and
    /// `<payload>/lib/libcudnn.so.9` entries.
    pub fn make_cudnn_archive(&self, file_name: &str, payload: &str) -> PathBuf {
        let tar = build_cudnn_tar(payload);
        let path = self.files.join(file_name);
        let file = fs::File::create(&path).expect("Failed to create archive");
        if file_name.ends_with(".tar.xz") {
            let mut enc = xz2::write::XzEncoder::new(file, 1);
            enc.write_all(&tar).expect("xz write");
            enc.finish().expect("xz finish");
        } else {
            let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::fast());
            enc.write_all(&tar).expect("gz write");
            enc.finish().expect("gz finish");
        }
        path
    }

    /// Plant a file inside a fake previous run's WorkArea.
    pub fn plant_workarea_file(&self, file_name: &str, contents: &[u8]) -> PathBuf {
        let run = self.work.join("run-1");
        fs::create_dir_all(&run).expect("Failed to create run dir");
        let path = run.join(file_name);
        fs::write(&path, contents).expect("Failed to plant file");
        path
    }

    pub fn install_root(&self, family: &str) -> PathBuf {
        self.prefix.join(format!("cuda-{family}"))
    }
}

fn build_cudnn_tar(payload: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let entries = [
        (format!("{payload}/include/cudnn.h"), &b"// cudnn"[..]),
        (format!("{payload}/include/cudnn_version.h"), &b"// v"[..]),
        (format!("{payload}/lib/libcudnn.so.9"), &b"elf"[..]),
    ];
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, data)
            .expect("tar append");
    }
    let mut link = tar::Header::new_gnu();
    link.set_entry_type(tar::EntryType::Symlink);
    link.set_size(0);
    link.set_cksum();
    builder
        .append_link(
            &mut link,
            format!("{payload}/lib/libcudnn.so"),
            "libcudnn.so.9",
        )
        .expect("tar symlink");
    builder.into_inner().expect("tar finish")
}

fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
}
