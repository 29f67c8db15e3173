//! 标准输入命令源
//!
//! 每行一条命令：空白或逗号分隔的数值。空行发送空消息（保活）。
//! `q` / `quit` / `exit` 请求停止。

use crate::bus::BusMessage;
use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, warn};

/// 一行输入的解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum InputLine {
    Values(Vec<f64>),
    Quit,
}

/// 解析一行输入
pub fn parse_line(line: &str) -> Result<InputLine, String> {
    let line = line.trim();
    if matches!(line, "q" | "quit" | "exit") {
        return Ok(InputLine::Quit);
    }

    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", token))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(InputLine::Values)
}

/// 启动读取标准输入的线程
///
/// 线程阻塞在 `read_line` 上，不会被 join；进程退出时随之结束。
pub fn spawn_stdin_reader(
    topic: &'static str,
    tx: Sender<BusMessage>,
    stop: Arc<AtomicBool>,
) -> Result<()> {
    thread::Builder::new()
        .name("tp-stdin".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    },
                };

                match parse_line(&line) {
                    Ok(InputLine::Quit) => {
                        stop.store(true, Ordering::Release);
                        break;
                    },
                    Ok(InputLine::Values(values)) => {
                        if tx.send(BusMessage::new(topic, &values)).is_err() {
                            break;
                        }
                    },
                    Err(e) => warn!("Ignoring input line: {}", e),
                }
            }
            debug!("stdin reader finished");
        })
        .context("Failed to spawn stdin reader thread")?;
    Ok(())
}
