//! 导出结果的保存与校验.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use nifti::NiftiHeader;
use thiserror::Error;

use crate::Idx3d;

/// gzip 魔数.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// 下载结果相关错误.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// 读写文件失败.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// 结果不是 gzip 数据.
    #[error("payload is not gzip compressed")]
    NotGzip,

    /// 解压后的数据不是合法的 NIfTI-1 头部.
    #[error("payload is not a NIfTI volume: {0}")]
    Nifti(String),

    /// 系统没有可用的下载目录.
    #[error("no download directory available")]
    NoDownloadDir,
}

/// 系统下载目录. 没有时退回到用户主目录.
pub fn default_download_dir() -> Option<PathBuf> {
    dirs::download_dir().or_else(dirs::home_dir)
}

/// 后端返回的 `segmented_image.nii.gz`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Materialized {
    file_name: String,
    bytes: Vec<u8>,
}

/// 从下载结果中读出的关键头部信息.
#[derive(Clone, Debug, PartialEq)]
pub struct NiftiSummary {
    /// 体数据形状 `(x, y, z)`.
    pub shape: Idx3d,
    /// NIfTI 数据类型代码.
    pub datatype: i16,
    /// 体素尺寸.
    pub pixdim: [f32; 3],
    /// sform 代码.
    pub sform_code: i16,
}

impl Materialized {
    /// 创建.
    #[inline]
    pub fn new(file_name: String, bytes: Vec<u8>) -> Self {
        Self { file_name, bytes }
    }

    /// 建议的文件名.
    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// 原始字节.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 字节数.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 是否以 gzip 魔数开头?
    #[inline]
    pub fn is_gzip(&self) -> bool {
        self.bytes.starts_with(&GZIP_MAGIC)
    }

    /// 保存到目录 `dir`, 返回完整路径. 同名文件被覆盖.
    pub fn save_to<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, DownloadError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        log::info!("Saved {} bytes to {}", self.bytes.len(), path.display());
        Ok(path)
    }

    /// 保存到 [`default_download_dir`].
    pub fn save_default(&self) -> Result<PathBuf, DownloadError> {
        let dir = default_download_dir().ok_or(DownloadError::NoDownloadDir)?;
        self.save_to(dir)
    }

    /// 解压并读取 NIfTI 头部.
    pub fn inspect(&self) -> Result<NiftiSummary, DownloadError> {
        if !self.is_gzip() {
            return Err(DownloadError::NotGzip);
        }
        let mut raw = Vec::new();
        // 头部固定为 348 字节, 不必解压全部体数据.
        GzDecoder::new(self.bytes.as_slice())
            .take(348)
            .read_to_end(&mut raw)?;
        let header =
            NiftiHeader::from_reader(raw.as_slice()).map_err(|e| DownloadError::Nifti(e.to_string()))?;

        let [_, x, y, z, ..] = header.dim;
        let [_, px, py, pz, ..] = header.pixdim;
        Ok(NiftiSummary {
            shape: (x as usize, y as usize, z as usize),
            datatype: header.datatype,
            pixdim: [px, py, pz],
            sform_code: header.sform_code,
        })
    }
}
