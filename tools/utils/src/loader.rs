//! 配置与脚本路径的加载器.

use lasso_berry::SegmenterConfig;
use std::env;
use std::path::PathBuf;

/// 获取配置文件路径.
///
/// 1. 若环境变量 `$LASSO_BERRY_CONFIG` 非空, 则返回其值;
/// 2. 否则, 返回 `{config_dir}/lasso-berry/config.json`;
/// 3. 系统没有配置目录时返回 `None`.
pub fn config_path_from_env_or_home() -> Option<PathBuf> {
    match env::var("LASSO_BERRY_CONFIG") {
        Ok(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => dirs::config_dir().map(|d| d.join("lasso-berry").join("config.json")),
    }
}

/// 加载配置. 文件不存在时使用默认配置; 文件存在但不合法时记录警告并使用默认配置.
pub fn load_config() -> SegmenterConfig {
    let Some(path) = config_path_from_env_or_home().filter(|p| p.is_file()) else {
        log::info!("No configuration file found, using defaults");
        return SegmenterConfig::default();
    };
    match SegmenterConfig::open(&path) {
        Ok(config) => {
            log::info!("Loaded configuration from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("{e}; using defaults");
            SegmenterConfig::default()
        }
    }
}

/// 获取回放脚本路径.
///
/// 1. 若命令行给出了第一个参数, 则返回它;
/// 2. 否则, 返回环境变量 `$LASSO_BERRY_SCRIPT` 的值.
pub fn script_path_from_args_or_env() -> Option<PathBuf> {
    env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::var_os("LASSO_BERRY_SCRIPT").map(PathBuf::from))
}
