use std::ffi::OsString;
use std::fs::{ self, File, OpenOptions };
use std::io::{ self, Write };
use std::path::{ Path, PathBuf };
use std::sync::{ Mutex, PoisonError };

/// A destination for formatted log lines.
pub trait Sink: Send + Sync {
    fn write_line(&self, line: &str) -> io::Result<()>;
    fn flush(&self) -> io::Result<()>;
}

pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", line)
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().flush()
    }
}

struct FileState {
    file: File,
    size: u64,
}

/// Appends to `path` and rolls it over to `path.1` .. `path.N` once the next
/// line would push it past `max_bytes`. The oldest backup is discarded. With
/// no backups or no size limit the file just grows.
pub struct RotatingFileSink {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    state: Mutex<FileState>,
}

impl RotatingFileSink {
    pub fn open<P: AsRef<Path>>(path: P, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backup_count,
            state: Mutex::new(FileState { file, size }),
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&self, state: &mut FileState) -> io::Result<()> {
        state.file.flush()?;

        for index in (1..self.backup_count).rev() {
            let src = self.backup_path(index);
            if src.exists() {
                let dst = self.backup_path(index + 1);
                if dst.exists() {
                    fs::remove_file(&dst)?;
                }
                fs::rename(&src, &dst)?;
            }
        }
        let first = self.backup_path(1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        fs::rename(&self.path, &first)?;

        state.file = OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?;
        state.size = 0;
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let len = (line.len() as u64) + 1;

        let rotating = self.max_bytes > 0 && self.backup_count > 0;
        if rotating && state.size > 0 && state.size + len >= self.max_bytes {
            self.rotate(&mut state)?;
        }

        state.file.write_all(line.as_bytes())?;
        state.file.write_all(b"\n")?;
        state.size += len;
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).file.flush()
    }
}
