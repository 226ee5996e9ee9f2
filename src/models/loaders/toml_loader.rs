use crate::models::application::ApplicationTask;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 读取并解析任意 TOML 文件
pub async fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("无法解析TOML文件: {}", path.display()))
}

/// 列出文件夹中所有 .toml 文件，按文件名排序
pub async fn list_toml_files(folder_path: &Path) -> Result<Vec<PathBuf>> {
    if !folder_path.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path.display());
    }

    let mut files = Vec::new();
    let mut entries = fs::read_dir(folder_path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// 从 TOML 文件加载一条申请任务
pub async fn load_application_task(path: &Path) -> Result<ApplicationTask> {
    let mut task: ApplicationTask = read_toml(path).await?;
    task.file_path = Some(path.to_string_lossy().to_string());
    Ok(task)
}

/// 加载队列文件夹中的所有申请任务
///
/// 无法解析的文件只记录警告并跳过，不影响其余任务
pub async fn load_application_queue(folder_path: &Path) -> Result<Vec<ApplicationTask>> {
    let mut tasks = Vec::new();

    for path in list_toml_files(folder_path).await? {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_application_task(&path).await {
            Ok(task) => tasks.push(task),
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(tasks)
}

/// 把处理完的任务文件移动到归档目录
pub async fn archive_task_file(task: &ApplicationTask, archive_dir: &Path) -> Result<()> {
    let Some(file_path) = task.file_path.as_deref() else {
        tracing::warn!("[申请 {}] ⚠️ 文件路径未设置", task.id);
        return Ok(());
    };

    let source = Path::new(file_path);
    if !source.exists() {
        tracing::warn!("[申请 {}] ⚠️ 文件不存在: {}", task.id, file_path);
        return Ok(());
    }

    fs::create_dir_all(archive_dir)
        .await
        .with_context(|| format!("无法创建归档目录: {}", archive_dir.display()))?;

    let target = archive_dir.join(source.file_name().unwrap_or_default());
    fs::rename(source, &target)
        .await
        .with_context(|| format!("无法归档文件: {}", file_path))?;

    tracing::info!("[申请 {}] ✓ 文件已归档: {}", task.id, target.display());
    Ok(())
}
