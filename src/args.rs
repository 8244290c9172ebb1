//! 命令行参数

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "modelmux", version, about = "按模型路由的 OpenAI 兼容网关")]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.json")]
    pub config: String,

    /// 覆盖配置中的监听地址
    #[arg(long)]
    pub host: Option<String>,

    /// 覆盖配置中的监听端口
    #[arg(short, long)]
    pub port: Option<u16>,
}
