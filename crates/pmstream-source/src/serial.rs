use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, SourceError};
use crate::traits::ByteSource;

/// Baud rate used by every supported sensor family.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Read timeout applied to TTYs so blocked reads return regularly.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Line settings for a serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed. Sensors talk 9600 8N1.
    pub baud_rate: u32,
    /// How long a read may block before reporting `TimedOut`.
    /// Rounded to tenths of a second, between 0.1 s and 25.5 s.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// A sensor serial port, or a plain file standing in for one.
///
/// When the path is a terminal the line is switched to raw 8N1 at the
/// configured speed, with a read timeout; an idle line then surfaces as
/// `ErrorKind::TimedOut` rather than end of stream. Any other path (a frame
/// dump, a FIFO) is read as-is and its end is the end of the stream.
///
/// The descriptor is closed when the port is dropped.
pub struct SerialPort {
    file: File,
    path: PathBuf,
    is_tty: bool,
}

impl SerialPort {
    /// Open `path` with the default line settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, &SerialConfig::default())
    }

    /// Open `path` and apply `config` if it is a terminal.
    pub fn open_with_config(path: impl AsRef<Path>, config: &SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_read_only(&path).map_err(|source| SourceError::Open {
            path: path.clone(),
            source,
        })?;

        let is_tty = is_terminal(&file);
        if is_tty {
            configure_line(&file, config).map_err(|err| match err {
                SourceError::Io(source) => SourceError::Configure {
                    path: path.clone(),
                    source,
                },
                other => other,
            })?;
            info!(?path, baud = config.baud_rate, "opened serial port");
        } else {
            debug!(?path, "opened non-terminal source, replaying as-is");
        }

        Ok(Self { file, path, is_tty })
    }

    /// The path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the path is a terminal device.
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Close the port now instead of at drop.
    pub fn close(self) {
        debug!(path = ?self.path, "closing source");
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.file.read(buf)?;
        if n == 0 && self.is_tty && !buf.is_empty() {
            // VMIN=0/VTIME>0 returns 0 when the timer expires on a quiet line.
            return Err(std::io::Error::from(ErrorKind::TimedOut));
        }
        Ok(n)
    }
}

impl ByteSource for SerialPort {
    fn discard_pending(&mut self) -> std::io::Result<()> {
        if self.is_tty {
            flush_input(&self.file)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("tty", &self.is_tty)
            .finish()
    }
}

#[cfg(unix)]
fn open_read_only(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)
}

#[cfg(not(unix))]
fn open_read_only(path: &Path) -> std::io::Result<File> {
    File::open(path)
}

#[cfg(unix)]
fn is_terminal(file: &File) -> bool {
    use std::os::fd::AsRawFd;

    // SAFETY: `isatty` only inspects the descriptor, which `file` keeps open.
    unsafe { libc::isatty(file.as_raw_fd()) == 1 }
}

#[cfg(not(unix))]
fn is_terminal(_file: &File) -> bool {
    false
}

#[cfg(unix)]
fn baud_constant(baud_rate: u32) -> Result<libc::speed_t> {
    let speed = match baud_rate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        other => return Err(SourceError::UnsupportedBaudRate(other)),
    };
    Ok(speed)
}

/// Tenths of a second for `VTIME`, clamped to what the field can hold.
fn vtime_deciseconds(timeout: Duration) -> u8 {
    let tenths = timeout.as_millis().div_ceil(100);
    tenths.clamp(1, u8::MAX as u128) as u8
}

#[cfg(unix)]
fn configure_line(file: &File, config: &SerialConfig) -> Result<()> {
    use std::os::fd::AsRawFd;

    let speed = baud_constant(config.baud_rate)?;
    let fd = file.as_raw_fd();

    // SAFETY: an all-zero `termios` is a valid value to be overwritten by
    // `tcgetattr`.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is an open terminal descriptor and `tio` is a valid,
    // writable `termios` for the duration of each call.
    unsafe {
        if libc::tcgetattr(fd, &mut tio) != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        libc::cfmakeraw(&mut tio);
        if libc::cfsetispeed(&mut tio, speed) != 0 || libc::cfsetospeed(&mut tio, speed) != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
    }

    tio.c_cflag |= libc::CLOCAL | libc::CREAD;
    tio.c_cflag &= !(libc::CSTOPB | libc::PARENB);
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = vtime_deciseconds(config.read_timeout);

    // SAFETY: see above; `tio` is fully initialised.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

#[cfg(not(unix))]
fn configure_line(_file: &File, _config: &SerialConfig) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn flush_input(file: &File) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    // SAFETY: `tcflush` on an open terminal descriptor owned by `file`.
    if unsafe { libc::tcflush(file.as_raw_fd(), libc::TCIFLUSH) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
fn flush_input(_file: &File) -> std::io::Result<()> {
    Ok(())
}
