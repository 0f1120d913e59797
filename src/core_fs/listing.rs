// Long-format directory listings built straight from directory entries.
use chrono::{DateTime, Duration, Local, TimeZone};
use std::fs::Metadata;
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;
use tokio::fs;

const SIX_MONTHS_DAYS: i64 = 182;

fn type_char(metadata: &Metadata) -> char {
    let file_type = metadata.file_type();
    if file_type.is_dir() {
        'd'
    } else if file_type.is_symlink() {
        'l'
    } else if file_type.is_fifo() {
        'p'
    } else if file_type.is_socket() {
        's'
    } else if file_type.is_char_device() {
        'c'
    } else if file_type.is_block_device() {
        'b'
    } else {
        '-'
    }
}

/// `rwxr-xr-x` style permission triplets, including setuid/setgid/sticky.
pub fn permission_string(mode: u32) -> String {
    let mut out = String::with_capacity(9);
    let specials = [(0o4000, 's', 'S'), (0o2000, 's', 'S'), (0o1000, 't', 'T')];

    for (i, shift) in [6u32, 3, 0].iter().enumerate() {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });

        let (flag, set_exec, set_noexec) = specials[i];
        let exec = bits & 0o1 != 0;
        out.push(match (mode & flag != 0, exec) {
            (true, true) => set_exec,
            (true, false) => set_noexec,
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    out
}

fn format_date(modified: DateTime<Local>, now: DateTime<Local>) -> String {
    let age = now.signed_duration_since(modified);
    if age >= Duration::zero() && age < Duration::days(SIX_MONTHS_DAYS) {
        modified.format("%b %e %H:%M").to_string()
    } else {
        modified.format("%b %e  %Y").to_string()
    }
}

/// One `ls -l` line for `name`, without the line terminator.
pub fn format_entry(name: &str, metadata: &Metadata, now: DateTime<Local>) -> String {
    let modified = Local
        .timestamp_opt(metadata.mtime(), 0)
        .single()
        .unwrap_or(now);

    format!(
        "{}{} {:>3} {:>5} {:>5} {:>10} {} {}",
        type_char(metadata),
        permission_string(metadata.mode()),
        metadata.nlink(),
        metadata.uid(),
        metadata.gid(),
        metadata.len(),
        format_date(modified, now),
        name
    )
}

/// Lists `path` the way `ls -l` would: a `total` line and one entry per
/// visible child sorted by name, or a single line when `path` is a file.
pub async fn list_directory(path: &Path) -> io::Result<Vec<String>> {
    let now = Local::now();
    let metadata = fs::metadata(path).await?;

    if !metadata.is_dir() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(vec![format_entry(&name, &metadata, now)]);
    }

    let mut entries = Vec::new();
    let mut dir = fs::read_dir(path).await?;
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        match fs::symlink_metadata(entry.path()).await {
            Ok(metadata) => entries.push((name, metadata)),
            Err(e) => log::warn!("Skipping {:?} in listing: {}", entry.path(), e),
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    // st_blocks counts 512-byte units, ls reports 1K blocks.
    let total: u64 = entries.iter().map(|(_, m)| m.blocks()).sum::<u64>() / 2;
    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!("total {}", total));

    for (name, metadata) in entries {
        let mut line = format_entry(&name, &metadata, now);
        if metadata.file_type().is_symlink() {
            if let Ok(target) = fs::read_link(path.join(&name)).await {
                line.push_str(&format!(" -> {}", target.display()));
            }
        }
        lines.push(line);
    }
    Ok(lines)
}
