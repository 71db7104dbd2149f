//! The demand-helper channel's core-side behavior (§4.5): dispatching
//! client-issued commands against the policy store, and issuing
//! core-initiated `OpenRemote`/`CloseRemote` notifications when a fetch
//! needs the helper to open a remote source the pipeline's own context
//! can't reach directly (§8 scenario 4).
//!
//! `tetherfs-transport` owns the connect/accept state machine and
//! envelope framing; this module owns what the decoded envelopes mean.
//! The wire format carries no correlation id (§6) because the channel
//! allows exactly one client and one outstanding exchange at a time, in
//! either direction — so both Commands and Notifications share one
//! `Mutex<HelperSession>`, and "the next envelope back is the reply" is
//! the whole correlation scheme. A command being served and a
//! notification being sent can't overlap; one simply waits for the
//! other's lock to free.

use std::sync::Mutex;

use tetherfs_transport::HelperSession;
use tetherfs_wire::{
    CloseRemoteRequest, CommandType, Envelope, NotificationType, OpenRemoteReply, OpenRemoteRequest,
    SetOperationModePayload, SetReportRatePayload, SetWatchPathsPayload, VersionReply,
};

use crate::config::ConfigSource;
use crate::context::CoreContext;
use crate::error::{Error, Result};
use crate::policy::OperationMode;

const PROTOCOL_VERSION: VersionReply = VersionReply { major: 1, minor: 0 };

pub struct HelperBridge {
    session: Mutex<HelperSession>,
    peer_pid: u32,
}

impl HelperBridge {
    pub fn new(session: HelperSession) -> Self {
        let peer_pid = session.peer_pid;
        HelperBridge {
            session: Mutex::new(session),
            peer_pid,
        }
    }

    pub fn peer_pid(&self) -> u32 {
        self.peer_pid
    }

    /// Services exactly one client-issued command: blocks until one
    /// arrives over the channel, dispatches it against `ctx`, and sends
    /// the reply. Callers loop this from a dedicated thread for the
    /// lifetime of the connection.
    pub fn serve_one_command(&self, ctx: &CoreContext, config: &dyn ConfigSource) -> Result<()> {
        let mut session = self.session.lock().unwrap();
        let envelope = session.recv()?;
        let reply_body = dispatch_command(ctx, config, &envelope)?;
        session.send(&Envelope::new(envelope.msg_type, reply_body))?;
        Ok(())
    }

    /// Sends `OpenRemote` and blocks for its reply (§4.5 Notifications,
    /// §8 scenario 4).
    pub fn open_remote(&self, path: &str) -> Result<u64> {
        let mut session = self.session.lock().unwrap();
        session.send(&Envelope::new(
            NotificationType::OpenRemote as u32,
            OpenRemoteRequest { path: path.to_string() }.encode(),
        ))?;
        let reply = session.recv()?;
        Ok(OpenRemoteReply::decode(&reply.body)?.file_handle)
    }

    /// Sends `CloseRemote` for a handle previously returned by
    /// [`Self::open_remote`]; no reply body is expected (§6).
    pub fn close_remote(&self, handle: u64) -> Result<()> {
        let mut session = self.session.lock().unwrap();
        session.send(&Envelope::new(
            NotificationType::CloseRemote as u32,
            CloseRemoteRequest { file_handle: handle }.encode(),
        ))?;
        Ok(())
    }
}

fn dispatch_command(ctx: &CoreContext, config: &dyn ConfigSource, envelope: &Envelope) -> Result<Vec<u8>> {
    let command = CommandType::from_u32(envelope.msg_type)
        .ok_or_else(|| Error::InvalidInput(format!("unknown command type {}", envelope.msg_type)))?;

    match command {
        CommandType::GetVersion => Ok(PROTOCOL_VERSION.encode()),
        CommandType::ReloadPolicy => {
            ctx.policy.reload_from_config(config);
            Ok(Vec::new())
        }
        CommandType::SetOperationMode => {
            let payload = SetOperationModePayload::decode(&envelope.body)?;
            ctx.policy.set_mode(OperationMode::from_bits(payload.mode));
            Ok(Vec::new())
        }
        CommandType::SetWatchPaths => {
            let payload = SetWatchPathsPayload::decode(&envelope.body)?;
            ctx.policy.clear_watch_paths();
            for path in &payload.paths {
                ctx.policy.add_watch_path(path)?;
            }
            Ok(Vec::new())
        }
        CommandType::SetReportRate => {
            let payload = SetReportRatePayload::decode(&envelope.body)?;
            ctx.policy.set_report_rate(payload.report_rate);
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::InMemoryPlatform;
    use std::io::Cursor;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Clone)]
    struct LoopbackBuf(Arc<StdMutex<Cursor<Vec<u8>>>>);
    impl LoopbackBuf {
        fn new() -> Self {
            LoopbackBuf(Arc::new(StdMutex::new(Cursor::new(Vec::new()))))
        }
        fn rewind(&self) {
            self.0.lock().unwrap().set_position(0);
        }
    }
    impl std::io::Read for LoopbackBuf {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().read(buf)
        }
    }
    impl std::io::Write for LoopbackBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            self.0.lock().unwrap().flush()
        }
    }

    struct NoopConfig;
    impl ConfigSource for NoopConfig {
        fn load(&self) -> Result<crate::config::LoadedPolicy> {
            Ok(crate::config::LoadedPolicy::default())
        }
    }

    fn session_pair() -> (HelperSession, LoopbackBuf) {
        let buf = LoopbackBuf::new();
        let flag = Arc::new(AtomicBool::new(true));
        (HelperSession::new(Box::new(buf.clone()), flag, 1234), buf)
    }

    #[test]
    fn get_version_command_replies_with_protocol_version() {
        let (session, buf) = session_pair();
        let ctx = CoreContext::new(Arc::new(InMemoryPlatform::new()));
        let bridge = HelperBridge::new(session);

        // Simulate the client's request already sitting in the loopback
        // buffer, then rewind so `serve_one_command` reads it back.
        let request = Envelope::new(CommandType::GetVersion as u32, Vec::new());
        buf.0.lock().unwrap().get_mut().extend_from_slice(&request.encode());
        buf.rewind();

        bridge.serve_one_command(&ctx, &NoopConfig).unwrap();

        let written = buf.0.lock().unwrap().get_ref().clone();
        let reply_start = request.encode().len();
        let (msg_type, _len) = Envelope::decode_header(&written[reply_start..reply_start + 8]).unwrap();
        assert_eq!(msg_type, CommandType::GetVersion as u32);
        let reply = VersionReply::decode(&written[reply_start + 8..]).unwrap();
        assert_eq!(reply, PROTOCOL_VERSION);
    }

    #[test]
    fn set_operation_mode_command_updates_policy() {
        let (session, buf) = session_pair();
        let ctx = CoreContext::new(Arc::new(InMemoryPlatform::new()));
        let bridge = HelperBridge::new(session);

        let request = Envelope::new(
            CommandType::SetOperationMode as u32,
            SetOperationModePayload { mode: 3 }.encode(),
        );
        buf.0.lock().unwrap().get_mut().extend_from_slice(&request.encode());
        buf.rewind();

        bridge.serve_one_command(&ctx, &NoopConfig).unwrap();
        assert_eq!(ctx.policy.get_mode(), OperationMode::from_bits(3));
    }

    #[test]
    fn unknown_command_type_is_rejected() {
        let (session, buf) = session_pair();
        let ctx = CoreContext::new(Arc::new(InMemoryPlatform::new()));
        let bridge = HelperBridge::new(session);

        let request = Envelope::new(99, Vec::new());
        buf.0.lock().unwrap().get_mut().extend_from_slice(&request.encode());
        buf.rewind();

        assert!(bridge.serve_one_command(&ctx, &NoopConfig).is_err());
    }
}
