use soflan::Chart;
use std::{
    env,
    error::Error,
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

const CHART_DIR: &str = "../charts";

const MIDI_EXT: &[&str] = &["mid", "midi"];

const INFO_COLLECTORS: &[(&str, fn(&Path) -> Result<(), Box<dyn Error>>)] = &[
    ("load_time", load_time),
    ("summary", summary),
    ("tempo_map", tempo_map),
    ("discarded_events", discarded_events),
];

fn load_time(path: &Path) -> Result<(), Box<dyn Error>> {
    let deadline = Instant::now() + Duration::from_millis(1000);
    let mut first = None;
    let mut total_fs = Duration::from_secs(0);
    let mut total_cpu = Duration::from_secs(0);
    let mut iters = 0;
    loop {
        let a = Instant::now();
        let data = fs::read(path)?;
        let b = Instant::now();
        let chart = Chart::parse(&data)?;
        let c = Instant::now();
        if let Some((_, _, note_count)) = first {
            total_fs += b - a;
            total_cpu += c - b;
            assert_eq!(note_count, chart.notes.len());
            iters += 1;
        } else {
            first = Some((b - a, c - b, chart.notes.len()));
        }
        if c >= deadline {
            break;
        }
    }
    let fmt_duration = |duration: Duration| (duration.as_micros() / 100) as f32 / 10.0;
    if iters > 0 {
        eprintln!(
            "fs: {}ms / cpu: {}ms in {} hot iters",
            fmt_duration(total_fs / iters),
            fmt_duration(total_cpu / iters),
            iters
        )
    } else if let Some((fs_time, cpu_time, _)) = first {
        eprintln!(
            "fs: {}ms / cpu: {}ms in 1 cold iter",
            fmt_duration(fs_time),
            fmt_duration(cpu_time),
        )
    }
    Ok(())
}

fn summary(path: &Path) -> Result<(), Box<dyn Error>> {
    let chart = Chart::open(path)?;
    let unbound = chart
        .presses()
        .filter(|note| note.button().is_none())
        .count();
    eprintln!(
        "{:?}, {} tracks, {} ticks/quarter: {} presses ({} unbound) / {} releases / \
         {} beat markers, {}s long",
        chart.header.format,
        chart.header.track_count,
        chart.division(),
        chart.presses().count(),
        unbound,
        chart.notes.len() - chart.presses().count(),
        chart.beats.len(),
        (chart.duration() / 100.0).floor() / 10.0,
    );
    Ok(())
}

fn tempo_map(path: &Path) -> Result<(), Box<dyn Error>> {
    let chart = Chart::open(path)?;
    eprintln!("{} segments", chart.tempo_segments.len());
    for segment in chart.tempo_segments.iter() {
        eprintln!(
            "        tick {} at {}ms: {} bpm ({}ms/tick){}",
            segment.tick,
            segment.time,
            segment.bpm,
            segment.tick_factor,
            if segment.implicit { " [implicit]" } else { "" },
        );
    }
    Ok(())
}

fn discarded_events(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::read(path)?;
    let (_header, tracks) = soflan::parse(&file)?;
    let mut kept = 0;
    let mut discarded = 0;
    for track in tracks {
        for ev in track?.events() {
            if ev?.kind.reaches_chart() {
                kept += 1;
            } else {
                discarded += 1;
            }
        }
    }
    eprintln!(
        "{} kept events / {} discarded events ({}%)",
        kept,
        discarded,
        (discarded * 1000 / (kept + discarded).max(1)) as f32 / 10.0,
    );
    Ok(())
}

fn list_midis(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut midis = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if MIDI_EXT
            .iter()
            .any(|ext| path.extension() == Some(ext.as_ref()))
        {
            midis.push(path);
        }
    }
    midis.sort();
    Ok(midis)
}

fn main() {
    let midi_filter = env::args().nth(1).unwrap_or_default().to_lowercase();
    let info_filter = env::args().nth(2).unwrap_or_default().to_lowercase();
    let midi_dir = env::args().nth(3).unwrap_or(CHART_DIR.to_string());

    let collectors = INFO_COLLECTORS
        .iter()
        .filter(|(name, _)| name.contains(&info_filter))
        .collect::<Vec<_>>();
    if collectors.is_empty() {
        eprintln!("no info collectors match the pattern \"{}\"", info_filter);
        eprint!("available info collectors: ");
        for (i, (name, _)) in INFO_COLLECTORS.iter().enumerate() {
            if i > 0 {
                eprint!(", ");
            }
            eprint!("{}", name);
        }
        eprintln!();
    }

    let unfiltered_midis = match list_midis(midi_dir.as_ref()) {
        Ok(midis) => midis,
        Err(err) => {
            eprintln!("failed to list charts in \"{}\": {}", midi_dir, err);
            return;
        }
    };
    let midis = unfiltered_midis
        .iter()
        .filter(|midi| {
            midi.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_lowercase()
                .contains(&midi_filter)
        })
        .collect::<Vec<_>>();
    if midis.is_empty() {
        eprintln!("no midi files match the pattern \"{}\"", midi_filter);
        eprintln!("available midi files:");
        for file in unfiltered_midis.iter() {
            eprintln!("  {}", file.display());
        }
    } else {
        for midi in midis {
            eprintln!("collecting info about chart \"{}\"", midi.display());
            for &(name, collect) in collectors.iter() {
                eprint!("  {}: ", name);
                if let Err(err) = collect(midi) {
                    eprintln!("collector error ({})", err);
                }
            }
            eprintln!();
        }
    }
}
