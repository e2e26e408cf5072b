//! Integration tests for the processor module
//!
//! Runs the complete evaluation against small export files written to a
//! temporary directory.


use crate::timestamp::Timestamp;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const STANDARDS_HEADER: &str = "Time,Analysis,Port,Identifier,Ignore,Inj_nmb,H2O mean,H2O sd,O18,O18 sd,H2,H2 sd,temperature,CH4,H2O sl,first";
pub const AMBIENT_HEADER: &str = "Time,Port,H2O mean,O18,H2";
pub const METEO_HEADER: &str =
    "interval;windvel;contemp;rh1;rh2;grad;apress;o3g1;o3g3;no;ventemp;winddir;prec";

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Timestamp {
    Timestamp::from_ymd_hms(year, month, day, hour, minute, 0).unwrap()
}

pub fn after(start: Timestamp, seconds: i64) -> Timestamp {
    Timestamp::from_epoch_seconds(start.epoch_seconds() + seconds).unwrap()
}

fn export(kind: &str, header: &str, rows: &str) -> String {
    format!(
        "Evaluation from: Mon Jan 10 09:00:00 2022\nType: {kind}\n\nRaw Data\n==========\n{header}\n{rows}"
    )
}

/// One ten-injection reference run starting at `start`, one minute per injection
pub fn reference_rows(analysis: &str, start: Timestamp) -> String {
    let d18o = [-8.0, -8.2, -8.4, -8.5, -8.60, -8.62, -8.58, -8.61, -8.59, -8.60];
    let d2h = [-58.0, -59.0, -60.0, -60.5, -61.0, -61.1, -60.9, -61.0, -61.1, -61.0];

    let mut rows = String::new();
    for i in 0..10 {
        let ts = after(start, 60 * i as i64);
        writeln!(
            rows,
            "{},{},2-1,VE,0,{},20000,100,{},0.08,{},0.4,45.0,1.9,1.65,0",
            ts,
            analysis,
            i + 1,
            d18o[i],
            d2h[i]
        )
        .unwrap();
    }
    rows
}

/// `count` ambient readings every 10 s at 15000 ppm
pub fn ambient_rows(start: Timestamp, count: usize, d18o: f64) -> String {
    let mut rows = String::new();
    for i in 0..count {
        let ts = after(start, 10 * i as i64);
        writeln!(rows, "{},Ambient,15000,{},{}", ts, d18o, 8.0 * d18o + 10.0).unwrap();
    }
    rows
}

/// Station records every 10 minutes
pub fn meteo_rows(start: Timestamp, count: usize) -> String {
    let mut rows = String::new();
    for i in 0..count {
        let dt = after(start, 600 * i as i64).as_datetime();
        writeln!(
            rows,
            "{};2.0;15.0;70;71;200;1000;30;31;2;14.5;180;0",
            dt.format("%Y-%m-%d %H:%M:%S")
        )
        .unwrap();
    }
    rows
}

pub fn write_standards(dir: &Path, name: &str, rows: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, export("Standards", STANDARDS_HEADER, rows)).unwrap();
    path
}

pub fn write_ambient(dir: &Path, name: &str, rows: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, export("Ambient", AMBIENT_HEADER, rows)).unwrap();
    path
}

pub fn write_meteo(dir: &Path, name: &str, rows: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("{METEO_HEADER}\n{rows}")).unwrap();
    path
}
