//! The interception pipeline (§4.1): the decisions a front-end driving
//! file-system requests against stubbed files must make at each of the
//! four hook points — pre-open, post-open, pre-read/write/mapping-acquire,
//! and query/enumeration — plus the sampled access-reporting draw.
//!
//! This module is pure decision logic; it never performs the open itself.
//! Grounded on the `smb` crate's layering of `Client`/`Connection` as a
//! request-decoration stage sitting in front of the wire transport,
//! generalized here from SMB2 PDU dispatch to the operation families
//! named in §4.1. A real front-end (a minifilter or a `dokan`/`winfsp`
//! driver shim) calls these functions at the corresponding hook and acts
//! on the returned decision.

use std::sync::atomic::{AtomicU32, Ordering};

use tetherfs_fscc::{
    DirectoryInformationList, FileAllInformation, FileAttributeTagInformation,
    FileBasicInformation, FileEndOfFileInformation, FileNetworkOpenInformation,
    FileStandardInformation, QueryFileInfoClass,
};

use crate::context::CoreContext;
use crate::error::{Error, Result};
use crate::platform::StubRecord;
use crate::policy::OperationMode;
use crate::stream_marker::StreamMarker;

/// Decorator bits the pipeline forces onto a re-issued open of a stub
/// (§4.1.1 point 2, §4.1.2 case 6). Modeled the way [`OperationMode`]
/// models its own small bitset rather than pulling in a flags crate for
/// two dozen rarely-combined constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreateOptions(u32);

impl CreateOptions {
    pub const OPEN_REPARSE_POINT: CreateOptions = CreateOptions(0x0020_0000);
    pub const OPEN_FOR_BACKUP_INTENT: CreateOptions = CreateOptions(0x0000_4000);
    pub const RANDOM_ACCESS: CreateOptions = CreateOptions(0x0000_0800);
    pub const WRITE_THROUGH: CreateOptions = CreateOptions(0x0000_0002);

    /// The bits required present on every stub open (§4.1.1 point 2).
    pub const MANDATORY: CreateOptions = CreateOptions(
        Self::OPEN_REPARSE_POINT.0
            | Self::OPEN_FOR_BACKUP_INTENT.0
            | Self::RANDOM_ACCESS.0
            | Self::WRITE_THROUGH.0,
    );

    pub fn from_bits(bits: u32) -> Self {
        CreateOptions(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: CreateOptions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: CreateOptions) {
        self.0 |= other.0;
    }
}

/// Share-access bits forced alongside [`CreateOptions::MANDATORY`]
/// (§4.1.1 point 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShareMode(u32);

impl ShareMode {
    pub const SHARE_READ: ShareMode = ShareMode(0x1);
    pub const SHARE_WRITE: ShareMode = ShareMode(0x2);
    pub const MANDATORY: ShareMode = ShareMode(Self::SHARE_READ.0 | Self::SHARE_WRITE.0);

    pub fn from_bits(bits: u32) -> Self {
        ShareMode(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: ShareMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ShareMode) {
        self.0 |= other.0;
    }
}

/// NT create disposition (§4.1.1 point 1). `OpenIf` is folded into the
/// same gate treatment as `Open` — see [`pre_open_gate`] (§9 Open
/// Questions: decided in `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDisposition {
    Supersede,
    Open,
    Create,
    OpenIf,
    Overwrite,
    OverwriteIf,
}

/// What an NT create actually did once it completed, independent of the
/// disposition that was requested — an `OpenIf` against a missing file
/// completes as `Created`, against an existing one as `Opened` (§4.1.2
/// case 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateResult {
    Superseded,
    Opened,
    Created,
    Overwritten,
}

impl CreateResult {
    /// True when the open replaced whatever content the file held
    /// (§4.1.2 case 7: "the stub's backing data is gone, so its metadata
    /// no longer describes anything real").
    pub fn replaced_content(self) -> bool {
        matches!(
            self,
            CreateResult::Superseded | CreateResult::Created | CreateResult::Overwritten
        )
    }
}

/// Inputs to the pre-open gate (§4.1.1).
pub struct OpenRequest {
    pub path: String,
    pub disposition: CreateDisposition,
    pub create_options: CreateOptions,
    pub share_mode: ShareMode,
    /// Opaque initiator identity, matching [`crate::policy::PolicyStore::is_trusted`].
    pub initiator: u64,
    pub is_directory: bool,
    pub is_volume_open: bool,
    /// The target was identified by numeric file id rather than a path,
    /// so there is no path to evaluate a stub against (§4.1.1 point 1).
    pub opened_by_id: bool,
    pub is_paging_io: bool,
    /// The open was generated by the interception layer's own re-issue
    /// (§4.1.2 case 6) rather than an original client request — must not
    /// re-enter the gate.
    pub is_reissue: bool,
}

/// The pre-open gate's decision.
pub enum PreOpenDecision {
    /// One of the point-1 disqualifiers applies, or the mode is fully
    /// disabled; the open proceeds untouched.
    Skip,
    /// The initiator is a trusted process (§4.1.1 point 3): decorate and
    /// let the open through with no further pipeline involvement.
    TrustedRelaxation {
        create_options: CreateOptions,
        share_mode: ShareMode,
    },
    /// Neither of the above; the open proceeds to post-open resolution.
    /// `report_rate` is already resolved against the watch-path set so
    /// post-open doesn't need to re-query the policy store.
    Continue { report_rate: u32 },
}

/// §4.1.1: decides whether an open is even a candidate for the rest of
/// the pipeline.
pub fn pre_open_gate(ctx: &CoreContext, request: &OpenRequest) -> PreOpenDecision {
    let mode = ctx.policy.get_mode();

    if request.is_directory
        || request.opened_by_id
        || request.is_volume_open
        || request.is_paging_io
        || request.is_reissue
        || matches!(request.disposition, CreateDisposition::Create)
        || mode == OperationMode::DISABLED
    {
        return PreOpenDecision::Skip;
    }

    if ctx.policy.is_trusted(request.initiator) {
        let mut create_options = request.create_options;
        create_options.insert(CreateOptions::MANDATORY);
        let mut share_mode = request.share_mode;
        share_mode.insert(ShareMode::MANDATORY);
        return PreOpenDecision::TrustedRelaxation {
            create_options,
            share_mode,
        };
    }

    let report_rate = if mode.contains(OperationMode::WATCH_ENABLED) {
        ctx.policy.report_rate_for(&request.path)
    } else {
        0
    };

    PreOpenDecision::Continue { report_rate }
}

/// Inputs to post-open resolution (§4.1.2): everything the completed
/// open itself reports, independent of the pipeline's own state.
pub struct OpenCompletion {
    pub stream_id: u64,
    pub path: String,
    /// `None` if the open surfaced no reparse status at all.
    pub reparse_tag: Option<u32>,
    /// Absent or `"::$DATA"` identifies the file's unnamed default
    /// stream (§4.1.2 case 5); anything else is an alternate data stream.
    pub stream_suffix: Option<String>,
    pub result: CreateResult,
    pub teardown_in_progress: bool,
    pub open_failed: bool,
    pub marked_for_deletion: bool,
    /// Whether the completed open's create options/share mode already
    /// carry [`CreateOptions::MANDATORY`]/[`ShareMode::MANDATORY`].
    pub decorators_present: bool,
}

/// True for the file's default data stream (§4.1.2 case 5).
pub fn is_default_data_stream(stream_suffix: Option<&str>) -> bool {
    match stream_suffix {
        None => true,
        Some(suffix) => suffix.eq_ignore_ascii_case("::$DATA"),
    }
}

/// Post-open resolution's decision (§4.1.2).
pub enum PostOpenAction {
    NoOp,
    /// Emit a sampled access event at the pre-resolved rate (§4.1.5);
    /// the caller draws against [`CoreContext::reporter`].
    SampledEvent { report_rate: u32 },
    /// The open must be re-issued with the given decorators before
    /// resolution can continue (§4.1.2 case 6); call
    /// [`post_open_resolution`] again against the re-issued completion.
    ReIssueRequired {
        create_options: CreateOptions,
        share_mode: ShareMode,
    },
    /// Content was replaced; the stub no longer describes anything real
    /// and has been cleared (§4.1.2 case 7).
    StubCleared,
    /// A stream marker was installed (or a racing installer's marker was
    /// kept) for this stream (§4.1.2 case 8).
    MarkerInstalled(StreamMarker),
    /// The platform call needed to act on this open's resolution failed;
    /// the whole open must fail with this error (§4.1.2 case 6's
    /// "failure here fails the whole open").
    Cancelled(Error),
}

/// §4.1.2: resolves a completed open against the stub's state. `mode` is
/// the value sampled at pre-open time (§4.1.1 point 4's ordering
/// guarantee: the mode used post-open is the mode observed pre-open).
/// `report_rate` is the value [`pre_open_gate`] resolved into its
/// `Continue` decision for this same open, carried through so case 2's
/// sampled event draws at the rate pre-open already settled on.
pub fn post_open_resolution(
    ctx: &CoreContext,
    completion: &OpenCompletion,
    mode: OperationMode,
    report_rate: u32,
) -> PostOpenAction {
    if completion.teardown_in_progress || completion.open_failed || completion.marked_for_deletion {
        return PostOpenAction::NoOp;
    }

    let Some(tag) = completion.reparse_tag else {
        return if mode.contains(OperationMode::WATCH_ENABLED) {
            PostOpenAction::SampledEvent { report_rate }
        } else {
            PostOpenAction::NoOp
        };
    };

    if tag != tetherfs_fscc::STUB_REPARSE_TAG {
        return PostOpenAction::NoOp;
    }

    if !mode.contains(OperationMode::FETCH_ENABLED) {
        return PostOpenAction::NoOp;
    }

    if !is_default_data_stream(completion.stream_suffix.as_deref()) {
        return PostOpenAction::NoOp;
    }

    if !completion.decorators_present {
        return PostOpenAction::ReIssueRequired {
            create_options: CreateOptions::MANDATORY,
            share_mode: ShareMode::MANDATORY,
        };
    }

    if completion.result.replaced_content() {
        return match ctx.platform.clear_stub(&completion.path) {
            Ok(()) => PostOpenAction::StubCleared,
            Err(e) => PostOpenAction::Cancelled(e),
        };
    }

    match ctx.platform.read_stub(&completion.path) {
        Ok(stub) => {
            let marker = StreamMarker {
                remote_size: stub.remote_size,
                remote_path: stub.remote_path,
                use_helper: stub.use_helper,
            };
            let installed = ctx.stream_markers.install_if_absent(completion.stream_id, marker);
            PostOpenAction::MarkerInstalled(installed)
        }
        Err(Error::NotAStub) => PostOpenAction::NoOp,
        Err(e) => PostOpenAction::Cancelled(e),
    }
}

/// §4.1.3: triggers a fetch ahead of a read, write, or mapping-acquire
/// against a marked stream. Trusted initiators bypass this entirely
/// (§4.1.1 point 3 extends past open to every later operation on the
/// handle). Blocks the calling thread until either this call becomes the
/// fetcher and completes the fetch, or a concurrent fetcher releases the
/// per-path lock (§4.3).
pub fn pre_read_write(ctx: &CoreContext, stream_id: u64, path: &str, initiator: u64) -> Result<()> {
    if ctx.policy.is_trusted(initiator) {
        return Ok(());
    }
    if ctx.stream_markers.get(stream_id).is_none() {
        return Ok(());
    }

    let handle = ctx.lock_table.get(path);
    let outcome = if ctx.lock_table.try_acquire(&handle) {
        run_fetch_if_still_stubbed(ctx, stream_id, path)
    } else {
        ctx.lock_table.wait_for_release(&handle);
        Ok(())
    };
    ctx.lock_table.release(handle);
    outcome
}

fn run_fetch_if_still_stubbed(ctx: &CoreContext, stream_id: u64, path: &str) -> Result<()> {
    let stub = match ctx.platform.read_stub(path) {
        // A peer already completed the fetch and cleared the stub
        // between marker install and this acquire (§4.1.3 step 5).
        Err(Error::NotAStub) => return Ok(()),
        Err(e) => return Err(e),
        Ok(stub) => stub,
    };

    run_fetch(ctx, path, &stub)?;
    ctx.platform.clear_stub(path)?;
    ctx.stream_markers.remove(stream_id);
    Ok(())
}

enum FetchSource {
    Direct(Box<dyn std::io::Read + Send>),
    Helper {
        reader: Box<dyn std::io::Read + Send>,
        handle: u64,
    },
}

/// §4.4 + §4.5: opens the remote source (falling back to the helper
/// channel when a direct open fails and the stub permits it, §8 scenario
/// 4) and drives the chunked copier.
fn run_fetch(ctx: &CoreContext, path: &str, stub: &StubRecord) -> Result<()> {
    let source = match ctx.platform.open_source(&stub.remote_path) {
        Ok(s) => FetchSource::Direct(s),
        Err(direct_err) if stub.use_helper => match open_via_helper(ctx, &stub.remote_path) {
            Some((reader, handle)) => FetchSource::Helper { reader, handle },
            // Any helper-path failure surfaces as the original direct
            // error, never as `PortDisconnected` (§7, §8 scenario 4).
            None => return Err(direct_err),
        },
        Err(direct_err) => return Err(direct_err),
    };

    let target = ctx.platform.extend_target(path, stub.remote_size)?;

    let (reader, helper_handle) = match source {
        FetchSource::Direct(r) => (r, None),
        FetchSource::Helper { reader, handle } => (reader, Some(handle)),
    };

    let copy_result = crate::copier::copy(reader, target, stub.remote_size);

    if copy_result.is_ok() {
        if let Some(handle) = helper_handle {
            if let Err(e) = ctx.close_remote_via_helper(handle) {
                log::warn!("helper CloseRemote failed for handle {handle}: {e}");
            }
        }
    }

    copy_result.map(|_bytes_copied| ())
}

fn open_via_helper(ctx: &CoreContext, remote_path: &str) -> Option<(Box<dyn std::io::Read + Send>, u64)> {
    let helper = ctx.helper()?;
    let handle = helper.open_remote(remote_path).ok()?;
    let peer_pid = helper.peer_pid();
    let reader = ctx.platform.open_via_duplicated_handle(peer_pid, handle).ok()?;
    Some((reader, handle))
}

/// §4.1.4: metadata spoofing for `FileBasicInformation` queries.
pub fn spoof_basic_information(info: &mut FileBasicInformation) {
    info.file_attributes.clear_stub_bits();
}

/// §4.1.4: metadata spoofing for `FileStandardInformation`. Only
/// substitutes `end_of_file` when the on-disk value is still zero — a
/// stub whose target file has already grown past zero (e.g. mid-fetch)
/// reports its real, growing length instead.
pub fn spoof_standard_information(info: &mut FileStandardInformation, marker: Option<&StreamMarker>) {
    if info.end_of_file == 0 {
        if let Some(marker) = marker {
            info.end_of_file = marker.remote_size.max(0) as u64;
        }
    }
}

/// §4.1.4: metadata spoofing for `FileEndOfFileInformation`.
pub fn spoof_end_of_file_information(info: &mut FileEndOfFileInformation, marker: Option<&StreamMarker>) {
    if info.end_of_file == 0 {
        if let Some(marker) = marker {
            info.end_of_file = marker.remote_size.max(0) as u64;
        }
    }
}

/// §4.1.4: metadata spoofing for `FileNetworkOpenInformation`.
pub fn spoof_network_open_information(info: &mut FileNetworkOpenInformation, marker: Option<&StreamMarker>) {
    if info.end_of_file == 0 {
        if let Some(marker) = marker {
            info.end_of_file = marker.remote_size.max(0) as u64;
        }
    }
    info.file_attributes.clear_stub_bits();
}

/// §4.1.4: metadata spoofing for `FileAttributeTagInformation`.
pub fn spoof_attribute_tag_information(info: &mut FileAttributeTagInformation) {
    info.file_attributes.clear_stub_bits();
}

/// §4.1.4: metadata spoofing for the composite `FileAllInformation`.
pub fn spoof_all_information(info: &mut FileAllInformation, marker: Option<&StreamMarker>) {
    spoof_basic_information(&mut info.basic);
    spoof_standard_information(&mut info.standard, marker);
}

/// §4.1.4: directory enumeration spoofing — clears the offline bit on
/// every eligible entry (`DirectoryEntry::clear_stub_offline_bit_if_eligible`
/// already encodes the directory/system exclusions).
pub fn spoof_directory_listing(list: &mut DirectoryInformationList) {
    for entry in list.iter_mut() {
        entry.clear_stub_offline_bit_if_eligible();
    }
}

/// True for the query-information classes that require the pipeline to
/// request synchronization on the handle before querying (§4.1.4: the
/// same four classes that clear stub attribute bits).
pub fn query_requires_synchronization(class: QueryFileInfoClass) -> bool {
    class.clears_stub_attribute_bits()
}

/// §4.1.5: sampled access reporting. A single process-wide xorshift32
/// generator advanced on every draw — not `rand`'s thread-local
/// generator, since sampling here is defined against one shared seed
/// rather than per-thread state.
pub struct SampledReporter {
    state: AtomicU32,
}

impl SampledReporter {
    pub fn new(seed: u32) -> Self {
        SampledReporter {
            state: AtomicU32::new(if seed == 0 { 0x9e37_79b9 } else { seed }),
        }
    }

    fn next_u31(&self) -> u32 {
        let mut x = self.state.load(Ordering::Relaxed);
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state.store(x, Ordering::Relaxed);
        x & 0x7FFF_FFFF
    }

    /// Draws once and reports whether this access should be emitted, at
    /// probability `report_rate / 10_000` (§4.6 `MAX_REPORT_RATE`).
    pub fn should_emit(&self, report_rate: u32) -> bool {
        if report_rate == 0 {
            return false;
        }
        if report_rate >= 10_000 {
            return true;
        }
        let threshold = (report_rate as u64 * 0x7FFF_FFFFu64) / 10_000;
        (self.next_u31() as u64) < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::InMemoryPlatform;
    use std::sync::Arc;

    fn request(path: &str) -> OpenRequest {
        OpenRequest {
            path: path.to_string(),
            disposition: CreateDisposition::Open,
            create_options: CreateOptions::default(),
            share_mode: ShareMode::default(),
            initiator: 1,
            is_directory: false,
            is_volume_open: false,
            opened_by_id: false,
            is_paging_io: false,
            is_reissue: false,
        }
    }

    fn ctx() -> CoreContext {
        CoreContext::new(Arc::new(InMemoryPlatform::new()))
    }

    #[test]
    fn pre_open_skips_directories_and_disabled_mode() {
        let c = ctx();
        c.policy.set_mode(OperationMode::FETCH_ENABLED);
        let mut req = request("C:\\data\\dir");
        req.is_directory = true;
        assert!(matches!(pre_open_gate(&c, &req), PreOpenDecision::Skip));

        c.policy.set_mode(OperationMode::DISABLED);
        let req = request("C:\\data\\file.bin");
        assert!(matches!(pre_open_gate(&c, &req), PreOpenDecision::Skip));
    }

    #[test]
    fn pre_open_skips_pure_create_disposition() {
        let c = ctx();
        c.policy.set_mode(OperationMode::FETCH_ENABLED);
        let mut req = request("C:\\data\\file.bin");
        req.disposition = CreateDisposition::Create;
        assert!(matches!(pre_open_gate(&c, &req), PreOpenDecision::Skip));
    }

    #[test]
    fn pre_open_relaxes_for_trusted_initiator() {
        let c = ctx();
        c.policy.set_mode(OperationMode::FETCH_ENABLED);
        c.policy.add_trusted_process(7);
        let mut req = request("C:\\data\\file.bin");
        req.initiator = 7;
        match pre_open_gate(&c, &req) {
            PreOpenDecision::TrustedRelaxation { create_options, share_mode } => {
                assert!(create_options.contains(CreateOptions::MANDATORY));
                assert!(share_mode.contains(ShareMode::MANDATORY));
            }
            _ => panic!("expected trusted relaxation"),
        }
    }

    #[test]
    fn pre_open_continues_with_watch_rate_when_enabled() {
        let c = ctx();
        c.policy.set_mode(OperationMode::FETCH_ENABLED | OperationMode::WATCH_ENABLED);
        c.policy.set_report_rate(500);
        c.policy.add_watch_path("c:\\data\\").unwrap();
        match pre_open_gate(&c, &request("C:\\data\\file.bin")) {
            PreOpenDecision::Continue { report_rate } => assert_eq!(report_rate, 500),
            _ => panic!("expected continue"),
        }
    }

    fn completion(path: &str) -> OpenCompletion {
        OpenCompletion {
            stream_id: 1,
            path: path.to_string(),
            reparse_tag: Some(tetherfs_fscc::STUB_REPARSE_TAG),
            stream_suffix: None,
            result: CreateResult::Opened,
            teardown_in_progress: false,
            open_failed: false,
            marked_for_deletion: false,
            decorators_present: true,
        }
    }

    #[test]
    fn post_open_requires_reissue_when_decorators_missing() {
        let c = ctx();
        let mut comp = completion("C:\\data\\file.bin");
        comp.decorators_present = false;
        let action = post_open_resolution(&c, &comp, OperationMode::FETCH_ENABLED, 0);
        assert!(matches!(action, PostOpenAction::ReIssueRequired { .. }));
    }

    #[test]
    fn post_open_clears_stub_when_content_replaced() {
        let c = ctx();
        let platform = InMemoryPlatform::new();
        platform.install_stub(
            "C:\\data\\file.bin",
            StubRecord {
                remote_size: 10,
                remote_path: "\\\\remote\\f".into(),
                use_helper: false,
            },
        );
        let c = CoreContext::new(Arc::new(platform));
        let mut comp = completion("C:\\data\\file.bin");
        comp.result = CreateResult::Overwritten;
        let action = post_open_resolution(&c, &comp, OperationMode::FETCH_ENABLED, 0);
        assert!(matches!(action, PostOpenAction::StubCleared));
    }

    #[test]
    fn post_open_installs_marker_for_plain_stub_open() {
        let platform = InMemoryPlatform::new();
        platform.install_stub(
            "C:\\data\\file.bin",
            StubRecord {
                remote_size: 4096,
                remote_path: "\\\\remote\\f".into(),
                use_helper: false,
            },
        );
        let c = CoreContext::new(Arc::new(platform));
        let comp = completion("C:\\data\\file.bin");
        match post_open_resolution(&c, &comp, OperationMode::FETCH_ENABLED, 0) {
            PostOpenAction::MarkerInstalled(marker) => assert_eq!(marker.remote_size, 4096),
            _ => panic!("expected marker installed"),
        }
    }

    #[test]
    fn post_open_noop_when_watch_disabled_and_no_reparse() {
        let c = ctx();
        let mut comp = completion("C:\\data\\file.bin");
        comp.reparse_tag = None;
        let action = post_open_resolution(&c, &comp, OperationMode::FETCH_ENABLED, 0);
        assert!(matches!(action, PostOpenAction::NoOp));
    }

    #[test]
    fn post_open_sampled_event_uses_pre_open_resolved_rate() {
        let c = ctx();
        let mut comp = completion("C:\\data\\file.bin");
        comp.reparse_tag = None;
        let action = post_open_resolution(
            &c,
            &comp,
            OperationMode::FETCH_ENABLED | OperationMode::WATCH_ENABLED,
            500,
        );
        assert!(matches!(action, PostOpenAction::SampledEvent { report_rate: 500 }));
    }

    #[test]
    fn pre_read_write_fetches_once_under_concurrent_access() {
        use std::thread;

        let platform = Arc::new(InMemoryPlatform::new());
        platform.install_stub(
            "C:\\data\\file.bin",
            StubRecord {
                remote_size: 5,
                remote_path: "\\\\remote\\f".into(),
                use_helper: false,
            },
        );
        platform.install_remote("\\\\remote\\f", vec![1, 2, 3, 4, 5]);
        let ctx = Arc::new(CoreContext::new(platform.clone()));
        ctx.stream_markers.install_if_absent(
            1,
            StreamMarker {
                remote_size: 5,
                remote_path: "\\\\remote\\f".into(),
                use_helper: false,
            },
        );
        ctx.stream_markers.install_if_absent(
            2,
            StreamMarker {
                remote_size: 5,
                remote_path: "\\\\remote\\f".into(),
                use_helper: false,
            },
        );

        let ctx2 = ctx.clone();
        let first = thread::spawn(move || pre_read_write(&ctx2, 1, "C:\\data\\file.bin", 99));
        let ctx3 = ctx.clone();
        let second = thread::spawn(move || pre_read_write(&ctx3, 2, "c:\\data\\file.bin", 99));

        first.join().unwrap().unwrap();
        second.join().unwrap().unwrap();

        assert_eq!(platform.target_contents("C:\\data\\file.bin"), vec![1, 2, 3, 4, 5]);
        assert!(!platform.has_stub("C:\\data\\file.bin"));
    }

    #[test]
    fn pre_read_write_skips_trusted_initiator() {
        let platform = Arc::new(InMemoryPlatform::new());
        platform.install_stub(
            "C:\\data\\file.bin",
            StubRecord {
                remote_size: 5,
                remote_path: "\\\\remote\\f".into(),
                use_helper: false,
            },
        );
        let ctx = CoreContext::new(platform.clone());
        ctx.policy.add_trusted_process(42);
        ctx.stream_markers.install_if_absent(
            1,
            StreamMarker {
                remote_size: 5,
                remote_path: "\\\\remote\\f".into(),
                use_helper: false,
            },
        );

        pre_read_write(&ctx, 1, "C:\\data\\file.bin", 42).unwrap();
        assert!(platform.has_stub("C:\\data\\file.bin"));
    }

    #[test]
    fn sampled_reporter_converges_near_configured_rate() {
        let reporter = SampledReporter::new(12345);
        let draws = 100_000;
        let hits = (0..draws).filter(|_| reporter.should_emit(600)).count();
        // Expected ~6000; generous tolerance since this is a statistical test.
        assert!((hits as i64 - 6000).abs() < 600, "hits={hits}");
    }

    #[test]
    fn sampled_reporter_zero_rate_never_emits() {
        let reporter = SampledReporter::new(1);
        assert!((0..1000).all(|_| !reporter.should_emit(0)));
    }

    #[test]
    fn sampled_reporter_max_rate_always_emits() {
        let reporter = SampledReporter::new(1);
        assert!((0..1000).all(|_| reporter.should_emit(10_000)));
    }

    #[test]
    fn is_default_data_stream_accepts_none_and_data_suffix() {
        assert!(is_default_data_stream(None));
        assert!(is_default_data_stream(Some("::$DATA")));
        assert!(!is_default_data_stream(Some(":custom:$DATA")));
    }
}
