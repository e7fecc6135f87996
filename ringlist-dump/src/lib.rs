//! Graphviz snapshot export for `ringlist` diagnostics.
//!
//! Renders a read-only [`Snapshot`] of a list as a dot digraph: one record
//! node per slot (payload plus both links), colored to tell the anchor,
//! live slots, and free slots apart, with the ring and free-chain order
//! encoded as an invisible layout hint. The picture makes index-surgery
//! bugs visible at a glance — a slot pointing into the free chain, a
//! back-link gone astray, a cycle where the anchor should be.
//!
//! The writer owns filename uniqueness: dumps land in a caller-supplied
//! directory under a local-time stamp (`DD-MM-YYYY_HH:MM:SS`), with a
//! numeric suffix appended on collision. Optionally the written file is fed
//! through the external `dot` renderer and the SVG appended to an HTML
//! report.
//!
//! # Wiring into a list
//!
//! ```no_run
//! use ringlist::{CallSite, RingList, Slot};
//! use ringlist_dump::DumpOptions;
//!
//! let mut list: RingList<f64> = RingList::init(10, CallSite::here("main")).unwrap();
//! ringlist_dump::install(&mut list, DumpOptions::new("target/dumps"));
//!
//! // From here on, any verification failure in a debug build exports a
//! // snapshot before the failing operation aborts.
//! list.insert_after(Slot::ANCHOR, 5.0, CallSite::here("main")).unwrap();
//! ```

use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;
use log::{debug, warn};

use ringlist::{CallSite, ListErrors, RingList, Slot, Snapshot};

const BACKGROUND_COLOR: &str = "#393f87";
const NODE_COLOR: &str = "#5e69db";
const ANCHOR_OUTLINE_COLOR: &str = "#dbd802";
const LIVE_OUTLINE_COLOR: &str = "#000000";
const FREE_OUTLINE_COLOR: &str = "#10c929";
const NEXT_EDGE_COLOR: &str = "#10c94b";
const PREV_EDGE_COLOR: &str = "#c95410";

/// Where and how to export snapshots.
///
/// Builder-style switches; only the output directory is mandatory.
#[derive(Clone, Debug)]
pub struct DumpOptions {
    dir: PathBuf,
    render_svg: bool,
    report: Option<PathBuf>,
}

impl DumpOptions {
    /// Export `.dot` files into `dir`. The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            render_svg: false,
            report: None,
        }
    }

    /// Also run `dot -Tsvg` on each written file, storing the SVG next to it.
    pub fn render_svg(mut self, enabled: bool) -> Self {
        self.render_svg = enabled;
        self
    }

    /// Append every rendered SVG to this HTML report file (implies
    /// [`render_svg`](Self::render_svg)).
    pub fn report(mut self, path: impl Into<PathBuf>) -> Self {
        self.report = Some(path.into());
        self
    }
}

/// Failure modes of a snapshot export.
#[derive(Debug)]
pub enum DumpError {
    /// The `.dot` snapshot could not be created or written.
    Snapshot(io::Error),
    /// The renderer, the SVG file, or the report file failed.
    Report(io::Error),
}

impl DumpError {
    /// Error bits to fold into the list's sticky mask.
    pub fn as_list_errors(&self) -> ListErrors {
        match self {
            DumpError::Snapshot(_) => ListErrors::DUMP_EXPORT,
            DumpError::Report(_) => ListErrors::DUMP_FILE,
        }
    }
}

impl Display for DumpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DumpError::Snapshot(error) => write!(f, "snapshot export failed: {error}"),
            DumpError::Report(error) => write!(f, "report update failed: {error}"),
        }
    }
}

impl std::error::Error for DumpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DumpError::Snapshot(error) | DumpError::Report(error) => Some(error),
        }
    }
}

/// Installs the export as the list's verification-failure observer.
///
/// Export trouble is logged and reported back to the list as
/// `DUMP_EXPORT`/`DUMP_FILE` bits; it never masks the structural error that
/// triggered the dump.
pub fn install<T: Display + 'static>(list: &mut RingList<T>, options: DumpOptions) {
    list.on_verify_failure(Box::new(move |snapshot, failing| {
        match dump_list(snapshot, failing, &options) {
            Ok(path) => {
                debug!("list dump written to {}", path.display());
                ListErrors::empty()
            }
            Err(error) => {
                warn!("list dump failed: {error}");
                error.as_list_errors()
            }
        }
    }));
}

/// Renders `snapshot` and writes it under a fresh timestamped filename in
/// the configured directory. Returns the path of the written `.dot` file.
///
/// Callable directly for ad-hoc inspection; the same routine backs the
/// failure observer installed by [`install`].
pub fn dump_list<T: Display>(
    snapshot: &Snapshot<'_, T>,
    failure: CallSite,
    options: &DumpOptions,
) -> Result<PathBuf, DumpError> {
    let dot = render_dot(snapshot, failure);

    let stamp = Local::now().format("%d-%m-%Y_%H:%M:%S").to_string();
    let (path, mut file) = create_unique(&options.dir, &stamp).map_err(DumpError::Snapshot)?;
    file.write_all(dot.as_bytes()).map_err(DumpError::Snapshot)?;
    drop(file);

    if options.render_svg || options.report.is_some() {
        render_report(&path, options)?;
    }

    Ok(path)
}

/// Produces the dot digraph for `snapshot`, annotated with the creation site
/// and the failing call site.
pub fn render_dot<T: Display>(snapshot: &Snapshot<'_, T>, failure: CallSite) -> String {
    let mut out = String::new();

    out.push_str("digraph {\n");
    out.push_str(&format!("\tbgcolor=\"{BACKGROUND_COLOR}\";\n"));
    out.push_str("\tsplines=ortho\n");

    write_call_data(&mut out, snapshot.creation(), failure);
    write_ordering_hint(&mut out, snapshot);
    write_rank_hint(&mut out, snapshot);
    write_pointer_boxes(&mut out, snapshot);

    for slot in snapshot.slots() {
        write_node(&mut out, snapshot, slot);
    }
    out.push('\n');
    for slot in snapshot.slots() {
        write_edges(&mut out, snapshot, slot);
    }

    out.push_str("}\n");
    out
}

fn annotation_style() -> String {
    format!(
        "style=\"filled, rounded\" fillcolor=\"{NODE_COLOR}\" shape=\"rectangle\" \
         color=\"{ANCHOR_OUTLINE_COLOR}\""
    )
}

fn write_call_data(out: &mut String, creation: CallSite, failure: CallSite) {
    let style = annotation_style();
    out.push_str(&format!(
        "\tcreated [{style} label=\"created in {}\"];\n",
        escape_label(&creation.to_string())
    ));
    out.push_str(&format!(
        "\tfailed [{style} label=\"failed in {}\"];\n",
        escape_label(&failure.to_string())
    ));
}

/// Invisible high-weight chain through ring order, the anchor, and
/// free-chain order: nudges the renderer into laying slots out in
/// structural order.
fn write_ordering_hint<T>(out: &mut String, snapshot: &Snapshot<'_, T>) {
    let mut chain: Vec<String> = snapshot.ring().map(|slot| slot.to_string()).collect();
    chain.push(Slot::ANCHOR.to_string());
    chain.extend(snapshot.free_chain().map(|slot| slot.to_string()));
    chain.push(snapshot.tail().to_string());

    out.push_str(&format!(
        "\t{} [weight=999999 style=invis];\n",
        chain.join(" -> ")
    ));
}

fn write_rank_hint<T>(out: &mut String, snapshot: &Snapshot<'_, T>) {
    out.push_str("\t{rank=same; ");
    for slot in snapshot.slots() {
        out.push_str(&format!("{slot} "));
    }
    out.push_str("}\n");
}

fn write_pointer_boxes<T>(out: &mut String, snapshot: &Snapshot<'_, T>) {
    let style = annotation_style();
    out.push_str(&format!("\tHead [{style}];\n"));
    out.push_str(&format!("\tHead -> {};\n", snapshot.head()));
    out.push_str(&format!("\tTail [{style}];\n"));
    out.push_str(&format!("\tTail -> {};\n", snapshot.tail()));
    out.push_str(&format!("\tFree [{style}];\n"));
    out.push_str(&format!(
        "\tFree -> {};\n",
        snapshot.free_head().unwrap_or(Slot::ANCHOR)
    ));
}

fn write_node<T: Display>(out: &mut String, snapshot: &Snapshot<'_, T>, slot: Slot) {
    let outline = if slot.is_anchor() {
        ANCHOR_OUTLINE_COLOR
    } else if snapshot.is_free(slot) {
        FREE_OUTLINE_COLOR
    } else {
        LIVE_OUTLINE_COLOR
    };

    // Free slots show the marker as -1, the way the tables are read.
    let prev = match snapshot.prev_of(slot) {
        Some(prev) => prev.index() as i64,
        None => -1,
    };
    let value = escape_label(&snapshot.value(slot).to_string());

    out.push_str(&format!(
        "\t{slot} [style=\"filled, rounded\" fillcolor=\"{NODE_COLOR}\" shape=\"Mrecord\" \
         color=\"{outline}\" label=\"<prev> prev: {prev} | {{<index> index: {slot} | \
         <data> value: {value}}} | <next> next: {next}\"];\n",
        next = snapshot.next_of(slot)
    ));
}

fn write_edges<T>(out: &mut String, snapshot: &Snapshot<'_, T>, slot: Slot) {
    if slot.is_anchor() {
        return;
    }

    let next = snapshot.next_of(slot);
    if !next.is_anchor() && next.index() < snapshot.capacity() {
        out.push_str(&format!(
            "\t{slot}:next -> {next} [color=\"{NEXT_EDGE_COLOR}\"];\n"
        ));
    }

    if let Some(prev) = snapshot.prev_of(slot) {
        if !prev.is_anchor() && prev.index() < snapshot.capacity() {
            out.push_str(&format!(
                "\t{slot}:prev -> {prev} [color=\"{PREV_EDGE_COLOR}\"];\n"
            ));
        }
    }
}

/// Escapes record-label metacharacters in payload and provenance text.
fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '"' | '|' | '{' | '}' | '<' | '>' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Claims `stamp.dot` in `dir`, appending `_1`, `_2`, ... until a fresh
/// name is found. `create_new` makes the claim atomic.
fn create_unique(dir: &Path, stamp: &str) -> io::Result<(PathBuf, fs::File)> {
    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            format!("{stamp}.dot")
        } else {
            format!("{stamp}_{suffix}.dot")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(error) if error.kind() == ErrorKind::AlreadyExists => suffix += 1,
            Err(error) => return Err(error),
        }
    }
}

fn render_report(dot_path: &Path, options: &DumpOptions) -> Result<(), DumpError> {
    let output = Command::new("dot")
        .arg("-Tsvg")
        .arg(dot_path)
        .output()
        .map_err(DumpError::Report)?;
    if !output.status.success() {
        warn!("dot renderer exited with {}", output.status);
        return Err(DumpError::Report(io::Error::other("dot renderer failed")));
    }

    let svg_path = dot_path.with_extension("svg");
    fs::write(&svg_path, &output.stdout).map_err(DumpError::Report)?;

    if let Some(report) = &options.report {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report)
            .map_err(DumpError::Report)?;
        writeln!(
            file,
            "<p>This dump has been created from file {}. List graph:</p>",
            dot_path.display()
        )
        .map_err(DumpError::Report)?;
        file.write_all(&output.stdout).map_err(DumpError::Report)?;
        writeln!(file).map_err(DumpError::Report)?;
    }

    Ok(())
}

/// Truncates an existing HTML report, ignoring a missing file.
pub fn clear_report(path: &Path) -> io::Result<()> {
    match fs::write(path, "") {
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
