//! 在 MNI152 2mm 网格上回放一段查看器事件脚本, 并报告得到的套索与体素.
//!
//! 用法: `replay <script.json>`, 或设置 `$LASSO_BERRY_SCRIPT`.

mod result;
mod runner;
mod script;

use script::Script;
use std::process::ExitCode;
use utils::loader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    simple_logger::init_with_level(log::Level::Info).unwrap();

    let Some(path) = loader::script_path_from_args_or_env() else {
        eprintln!("usage: replay <script.json>");
        return ExitCode::FAILURE;
    };
    let script = match Script::open(&path) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Cannot read script: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = loader::load_config();
    match runner::run(&script, config).await {
        Ok(result) => {
            result.describe().unwrap();
            if result.failures() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            log::error!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
