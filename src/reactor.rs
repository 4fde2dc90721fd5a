//! Thin wrappers over epoll, a self-pipe and timerfd.

use std::{
    io,
    os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd},
    ptr,
    time::Duration,
};

fn cvt(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

fn timespec(d: Duration) -> libc::timespec {
    libc::timespec {
        tv_sec: d.as_secs() as libc::time_t,
        tv_nsec: d.subsec_nanos() as libc::c_long,
    }
}

/// Level-triggered readiness for a handful of descriptors, keyed by token.
#[derive(Debug)]
pub struct Poller {
    fd: OwnedFd,
}

impl Poller {
    pub fn new() -> io::Result<Self> {
        let fd = cvt(unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) })?;
        Ok(Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    pub fn add(&self, fd: RawFd, token: u64) -> io::Result<()> {
        let mut event = libc::epoll_event {
            events: libc::EPOLLIN as u32,
            u64: token,
        };
        cvt(unsafe { libc::epoll_ctl(self.fd.as_raw_fd(), libc::EPOLL_CTL_ADD, fd, &mut event) })?;
        Ok(())
    }

    pub fn delete(&self, fd: RawFd) -> io::Result<()> {
        cvt(unsafe {
            libc::epoll_ctl(self.fd.as_raw_fd(), libc::EPOLL_CTL_DEL, fd, ptr::null_mut())
        })?;
        Ok(())
    }

    /// Waits for readiness and leaves the ready tokens in `ready`.
    /// Interrupted waits come back empty instead of failing.
    pub fn wait(&self, ready: &mut Vec<u64>, timeout: Option<Duration>) -> io::Result<()> {
        let mut events = [libc::epoll_event { events: 0, u64: 0 }; 32];
        let timeout = timeout.map_or(-1, |d| d.as_millis().min(i32::MAX as u128) as libc::c_int);
        ready.clear();

        let n = unsafe {
            libc::epoll_wait(
                self.fd.as_raw_fd(),
                events.as_mut_ptr(),
                events.len() as libc::c_int,
                timeout,
            )
        };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }
        ready.extend(events[..n as usize].iter().map(|e| e.u64));
        Ok(())
    }
}

/// The self-pipe. Writing a byte makes the read end readable until drained.
#[derive(Debug)]
pub struct Waker {
    read: OwnedFd,
    write: OwnedFd,
}

impl Waker {
    pub fn new() -> io::Result<Self> {
        let mut fds = [0 as libc::c_int; 2];
        cvt(unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK | libc::O_CLOEXEC) })?;
        Ok(unsafe {
            Self {
                read: OwnedFd::from_raw_fd(fds[0]),
                write: OwnedFd::from_raw_fd(fds[1]),
            }
        })
    }

    pub fn wake(&self) {
        let byte = 1u8;
        // a full pipe is already awake
        let _ = unsafe { libc::write(self.write.as_raw_fd(), (&byte as *const u8).cast(), 1) };
    }

    pub fn drain(&self) {
        let mut buf = [0u8; 64];
        loop {
            let n = unsafe { libc::read(self.read.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
            if n <= 0 {
                break;
            }
        }
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.read.as_raw_fd()
    }
}

/// A monotonic timerfd, one-shot or periodic.
#[derive(Debug)]
pub struct Timer {
    fd: OwnedFd,
}

impl Timer {
    pub fn new(delay: Duration, interval: Option<Duration>) -> io::Result<Self> {
        let fd = cvt(unsafe {
            libc::timerfd_create(libc::CLOCK_MONOTONIC, libc::TFD_NONBLOCK | libc::TFD_CLOEXEC)
        })?;
        let timer = Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        };

        // an all-zero value disarms the timer
        let delay = delay.max(Duration::from_nanos(1));
        let spec = libc::itimerspec {
            it_interval: timespec(interval.map_or(Duration::ZERO, |i| i.max(delay))),
            it_value: timespec(delay),
        };
        cvt(unsafe { libc::timerfd_settime(timer.fd.as_raw_fd(), 0, &spec, ptr::null_mut()) })?;
        Ok(timer)
    }

    /// Expirations since the last read; zero if none are pending.
    pub fn read(&self) -> u64 {
        let mut count = 0u64;
        let n = unsafe {
            libc::read(
                self.fd.as_raw_fd(),
                (&mut count as *mut u64).cast(),
                std::mem::size_of::<u64>(),
            )
        };
        if n == std::mem::size_of::<u64>() as isize {
            count
        } else {
            0
        }
    }

    pub fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waker_stays_ready_until_drained() {
        let poller = Poller::new().unwrap();
        let waker = Waker::new().unwrap();
        poller.add(waker.as_raw_fd(), 7).unwrap();
        let mut ready = Vec::new();

        poller.wait(&mut ready, Some(Duration::ZERO)).unwrap();
        assert!(ready.is_empty());

        waker.wake();
        waker.wake();
        poller.wait(&mut ready, Some(Duration::ZERO)).unwrap();
        assert_eq!(ready, vec![7]);
        // level triggered: still there
        poller.wait(&mut ready, Some(Duration::ZERO)).unwrap();
        assert_eq!(ready, vec![7]);

        waker.drain();
        poller.wait(&mut ready, Some(Duration::ZERO)).unwrap();
        assert!(ready.is_empty());
    }

    #[test]
    fn timer_fires_once_then_goes_quiet() {
        let poller = Poller::new().unwrap();
        let timer = Timer::new(Duration::from_millis(5), None).unwrap();
        poller.add(timer.as_raw_fd(), 3).unwrap();
        let mut ready = Vec::new();

        poller.wait(&mut ready, Some(Duration::from_secs(2))).unwrap();
        assert_eq!(ready, vec![3]);
        assert_eq!(timer.read(), 1);
        assert_eq!(timer.read(), 0);

        poller.delete(timer.as_raw_fd()).unwrap();
        poller.wait(&mut ready, Some(Duration::from_millis(20))).unwrap();
        assert!(ready.is_empty());
    }
}
