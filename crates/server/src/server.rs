//! Listener lifecycle for the single target connection.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use scripting_reflect::{
    AnyValue, Class, Constructor, Executable, Field, Method, Object, ReflectError, Result,
    Runtime, RuntimeId,
};
use tracing::{info, warn};

use crate::{RemoteRuntime, ServerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unbound,
    Listening,
    Connected,
    Closed,
}

/// Accepts one connection from the in-target agent and serves reflection
/// requests over it.
///
/// [`start`](ScriptingServer::start) returns as soon as the socket is bound.
/// The first runtime operation blocks until the agent has connected.
pub struct ScriptingServer {
    config: ServerConfig,
    id: RuntimeId,
    state: ConnectionState,
    local_addr: Option<SocketAddr>,
    stopping: Arc<AtomicBool>,
    accept_thread: Option<JoinHandle<()>>,
    incoming: Option<Receiver<io::Result<TcpStream>>>,
    runtime: Option<RemoteRuntime<TcpStream>>,
}

impl ScriptingServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            id: RuntimeId::next(),
            state: ConnectionState::Unbound,
            local_addr: None,
            stopping: Arc::new(AtomicBool::new(false)),
            accept_thread: None,
            incoming: None,
            runtime: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Bound port, once started.
    pub fn port(&self) -> Option<u16> {
        self.local_addr.map(|addr| addr.port())
    }

    /// Binds the listener and starts waiting for the agent in the background.
    ///
    /// Returns the bound port, which differs from the configured one when
    /// that was 0.
    pub fn start(&mut self) -> io::Result<u16> {
        if self.state != ConnectionState::Unbound {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "scripting server was already started",
            ));
        }
        let listener = TcpListener::bind((self.config.bind_address, self.config.port))?;
        let local_addr = listener.local_addr()?;

        let (tx, rx) = mpsc::sync_channel(1);
        let stopping = Arc::clone(&self.stopping);
        let handle = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || {
                let accepted = listener.accept();
                if stopping.load(Ordering::Acquire) {
                    return;
                }
                match &accepted {
                    Ok((_, peer)) => info!(%peer, "target connected"),
                    Err(err) => warn!(%err, "accepting the target failed"),
                }
                // The server may be gone already; nobody is left to tell.
                let _ = tx.send(accepted.map(|(stream, _)| stream));
            })?;

        self.local_addr = Some(local_addr);
        self.accept_thread = Some(handle);
        self.incoming = Some(rx);
        self.state = ConnectionState::Listening;
        info!(addr = %local_addr, "scripting server listening");
        Ok(local_addr.port())
    }

    /// Returns the connected runtime, blocking until the agent connects.
    pub fn runtime(&mut self) -> Result<&mut RemoteRuntime<TcpStream>> {
        if self.runtime.is_none() {
            if self.state != ConnectionState::Listening {
                return Err(ReflectError::NotConnected);
            }
            let incoming = self.incoming.take().ok_or(ReflectError::NotConnected)?;
            let stream = match incoming.recv() {
                Ok(accepted) => accepted?,
                Err(_) => return Err(ReflectError::NotConnected),
            };
            if let Err(err) = stream.set_nodelay(true) {
                warn!(%err, "failed to disable Nagle's algorithm");
            }
            self.join_accept_thread();
            self.runtime = Some(RemoteRuntime::with_id(self.id, stream, &self.config));
            self.state = ConnectionState::Connected;
        }
        self.runtime.as_mut().ok_or(ReflectError::NotConnected)
    }

    /// Closes the connection and the listener. Safe to call more than once.
    pub fn stop(&mut self) {
        if matches!(self.state, ConnectionState::Unbound | ConnectionState::Closed) {
            self.state = ConnectionState::Closed;
            return;
        }
        self.stopping.store(true, Ordering::Release);

        if let Some(runtime) = self.runtime.take() {
            if let Err(err) = runtime.get_ref().shutdown(Shutdown::Both) {
                warn!(%err, "failed to shut the target connection down");
            }
        } else if self
            .accept_thread
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            self.unblock_accept();
        }
        self.join_accept_thread();
        self.incoming = None;
        self.state = ConnectionState::Closed;
        info!("scripting server stopped");
    }

    /// Connects to the listener so a pending `accept` returns.
    fn unblock_accept(&self) {
        let Some(mut addr) = self.local_addr else {
            return;
        };
        if addr.ip().is_unspecified() {
            addr.set_ip(match addr {
                SocketAddr::V4(_) => std::net::Ipv4Addr::LOCALHOST.into(),
                SocketAddr::V6(_) => std::net::Ipv6Addr::LOCALHOST.into(),
            });
        }
        if let Err(err) = TcpStream::connect(addr) {
            warn!(%err, "failed to wake the accept thread");
        }
    }

    fn join_accept_thread(&mut self) {
        if let Some(handle) = self.accept_thread.take() {
            if handle.join().is_err() {
                warn!("accept thread panicked");
            }
        }
    }
}

impl Drop for ScriptingServer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Runtime for ScriptingServer {
    fn id(&self) -> RuntimeId {
        self.id
    }

    fn resolve_class(&mut self, name: &str) -> Result<Class> {
        self.runtime()?.resolve_class(name)
    }

    fn resolve_class_of(&mut self, obj: &Object) -> Result<Class> {
        self.runtime()?.resolve_class_of(obj)
    }

    fn resolve_field(&mut self, class: &Class, name: &str, field_type: &Class) -> Result<Field> {
        self.runtime()?.resolve_field(class, name, field_type)
    }

    fn resolve_method(
        &mut self,
        class: &Class,
        name: &str,
        parameter_types: &[Class],
    ) -> Result<Method> {
        self.runtime()?.resolve_method(class, name, parameter_types)
    }

    fn resolve_constructor(
        &mut self,
        class: &Class,
        parameter_types: &[Class],
    ) -> Result<Constructor> {
        self.runtime()?.resolve_constructor(class, parameter_types)
    }

    fn get_field(&mut self, field: &Field, owner: Option<&Object>) -> Result<AnyValue> {
        self.runtime()?.get_field(field, owner)
    }

    fn set_field(&mut self, field: &Field, owner: Option<&Object>, value: &AnyValue) -> Result<()> {
        self.runtime()?.set_field(field, owner, value)
    }

    fn invoke(
        &mut self,
        executable: &dyn Executable,
        owner: Option<&Object>,
        args: &[AnyValue],
    ) -> Result<AnyValue> {
        self.runtime()?.invoke(executable, owner, args)
    }

    fn is_instance(&mut self, class: &Class, obj: &Object) -> Result<bool> {
        self.runtime()?.is_instance(class, obj)
    }
}
