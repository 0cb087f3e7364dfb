//! 步骤图引擎
//!
//! 一张静态声明的有名步骤图：若干节点、每节点至多一条出边、至多一条
//! 条件边（循环判定）和至多一条指定回边。`compile()` 负责校验，
//! `run()` 负责按图执行并对每个节点返回的 `StatePatch` 做浅合并。
//!
//! 引擎自身不做任何 I/O；所有副作用（调 LLM、写文档）都在节点内部。
//! 任一节点失败则立即中止，不合并该节点的更新，也不回滚已持久化的章节。

use crate::error::{AppError, AppResult, GraphError};
use crate::workflow::state::{StatePatch, WorkflowState};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 节点名（静态声明）
pub type NodeName = &'static str;

/// 步骤节点
///
/// 节点拿到完整的当前状态（只读），返回要覆盖的字段集合。
#[async_trait]
pub trait StepNode: Send + Sync {
    fn name(&self) -> NodeName;

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch>;
}

/// 循环判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopDecision {
    /// 继续循环（走条件边的 continue 目标）
    Continue,
    /// 自然终止
    Terminate,
}

/// 条件判定函数：纯函数，只看状态里的计数器
pub type Condition = fn(&WorkflowState) -> LoopDecision;

struct ConditionalEdge {
    from: NodeName,
    condition: Condition,
    continue_to: NodeName,
}

/// 步骤图构建器
///
/// 用法（与固定的章节流程一致）：
/// 先 `add_node` 注册全部节点，再 `set_entry` / `add_edge` /
/// `add_conditional_edge` / `add_loop_edge` 声明结构，最后 `compile()`。
#[derive(Default)]
pub struct WorkflowGraph {
    nodes: Vec<Box<dyn StepNode>>,
    entry: Option<NodeName>,
    edges: Vec<(NodeName, NodeName)>,
    conditional: Option<ConditionalEdge>,
    loop_edges: Vec<(NodeName, NodeName)>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个节点
    pub fn add_node(mut self, node: Box<dyn StepNode>) -> Self {
        self.nodes.push(node);
        self
    }

    /// 设置入口节点
    pub fn set_entry(mut self, name: NodeName) -> Self {
        self.entry = Some(name);
        self
    }

    /// 添加一条普通顺序边
    pub fn add_edge(mut self, from: NodeName, to: NodeName) -> Self {
        self.edges.push((from, to));
        self
    }

    /// 添加条件边：`condition` 返回 Continue 时走 `continue_to`，
    /// 返回 Terminate 时整个运行自然结束
    pub fn add_conditional_edge(
        mut self,
        from: NodeName,
        condition: Condition,
        continue_to: NodeName,
    ) -> Self {
        self.conditional = Some(ConditionalEdge {
            from,
            condition,
            continue_to,
        });
        self
    }

    /// 添加指定的回边（实现循环的唯一一条）
    pub fn add_loop_edge(mut self, from: NodeName, to: NodeName) -> Self {
        self.loop_edges.push((from, to));
        self
    }

    /// 校验并编译
    ///
    /// 校验内容：
    /// - 入口已设置且存在
    /// - 节点名不重复，所有边的端点都已注册
    /// - 每个节点至多一条出边（普通边 / 条件边 / 回边合计）
    /// - 回边至多一条
    /// - 去掉回边之后整张图必须是 DAG
    pub fn compile(self) -> AppResult<CompiledWorkflow> {
        let mut nodes: HashMap<NodeName, Box<dyn StepNode>> = HashMap::new();
        for node in self.nodes {
            let name = node.name();
            if nodes.insert(name, node).is_some() {
                return Err(AppError::Graph(GraphError::DuplicateNode {
                    name: name.to_string(),
                }));
            }
        }

        let entry = self.entry.ok_or(AppError::Graph(GraphError::MissingEntry))?;
        Self::check_known(&nodes, entry)?;

        if self.loop_edges.len() > 1 {
            let (from, to) = self.loop_edges[1];
            return Err(AppError::Graph(GraphError::DuplicateLoopEdge {
                from: from.to_string(),
                to: to.to_string(),
            }));
        }
        let loop_edge = self.loop_edges.first().copied();

        // 每个节点至多一条出边
        let mut next: HashMap<NodeName, NodeName> = HashMap::new();
        let mut has_out: HashSet<NodeName> = HashSet::new();
        for &(from, to) in &self.edges {
            Self::check_known(&nodes, from)?;
            Self::check_known(&nodes, to)?;
            if !has_out.insert(from) {
                return Err(AppError::Graph(GraphError::DuplicateEdge {
                    from: from.to_string(),
                }));
            }
            next.insert(from, to);
        }
        if let Some(cond) = &self.conditional {
            Self::check_known(&nodes, cond.from)?;
            Self::check_known(&nodes, cond.continue_to)?;
            if !has_out.insert(cond.from) {
                return Err(AppError::Graph(GraphError::DuplicateEdge {
                    from: cond.from.to_string(),
                }));
            }
        }
        if let Some((from, to)) = loop_edge {
            Self::check_known(&nodes, from)?;
            Self::check_known(&nodes, to)?;
            if !has_out.insert(from) {
                return Err(AppError::Graph(GraphError::DuplicateEdge {
                    from: from.to_string(),
                }));
            }
        }

        // 去掉回边后做环检测（沿普通边 + 条件边的 continue 方向）
        let mut forward: HashMap<NodeName, NodeName> = next.clone();
        if let Some(cond) = &self.conditional {
            forward.insert(cond.from, cond.continue_to);
        }
        let mut visited: HashSet<NodeName> = HashSet::new();
        let mut current = entry;
        loop {
            if !visited.insert(current) {
                return Err(AppError::Graph(GraphError::CycleDetected {
                    node: current.to_string(),
                }));
            }
            match forward.get(current) {
                Some(&to) => current = to,
                None => break,
            }
        }

        Ok(CompiledWorkflow {
            nodes,
            entry,
            next,
            conditional: self.conditional,
            loop_edge,
        })
    }

    fn check_known(nodes: &HashMap<NodeName, Box<dyn StepNode>>, name: NodeName) -> AppResult<()> {
        if nodes.contains_key(name) {
            Ok(())
        } else {
            Err(AppError::Graph(GraphError::UnknownNode {
                name: name.to_string(),
            }))
        }
    }
}

/// 编译后的步骤图，可多次运行
pub struct CompiledWorkflow {
    nodes: HashMap<NodeName, Box<dyn StepNode>>,
    entry: NodeName,
    next: HashMap<NodeName, NodeName>,
    conditional: Option<ConditionalEdge>,
    loop_edge: Option<(NodeName, NodeName)>,
}

impl CompiledWorkflow {
    /// 从入口开始执行，直到走到终端节点或条件边判定终止
    ///
    /// 节点失败时立即返回错误，该节点的更新不会被合并。
    pub async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let mut current = self.entry;
        loop {
            debug!("▶ 执行步骤: {}", current);

            // compile() 保证所有边的端点都已注册
            let node = self
                .nodes
                .get(current)
                .ok_or_else(|| anyhow::anyhow!("步骤图状态不一致: 未注册的节点 {}", current))?;

            let patch = node
                .run(&state)
                .await
                .with_context(|| format!("步骤 {} 执行失败", current))?;
            state.apply(patch);

            // 条件边优先：判定走向或终止
            if let Some(cond) = &self.conditional {
                if cond.from == current {
                    match (cond.condition)(&state) {
                        LoopDecision::Terminate => {
                            debug!("⏹ 条件边判定终止 (节点: {})", current);
                            break;
                        }
                        LoopDecision::Continue => {
                            current = cond.continue_to;
                            continue;
                        }
                    }
                }
            }

            if let Some(&to) = self.next.get(current) {
                current = to;
                continue;
            }

            if let Some((from, to)) = self.loop_edge {
                if from == current {
                    current = to;
                    continue;
                }
            }

            // 无出边：终端节点
            debug!("⏹ 到达终端节点: {}", current);
            break;
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::BookRequest;

    /// 往 qna 里追加一条记录，用于观察执行顺序和合并语义
    struct RecordStep {
        name: NodeName,
    }

    #[async_trait]
    impl StepNode for RecordStep {
        fn name(&self) -> NodeName {
            self.name
        }

        async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
            let mut qna = state.qna.clone();
            qna.push((self.name.to_string(), state.chapter_number.to_string()));
            Ok(StatePatch {
                qna: Some(qna),
                ..Default::default()
            })
        }
    }

    struct IncrementStep;

    #[async_trait]
    impl StepNode for IncrementStep {
        fn name(&self) -> NodeName {
            "increment"
        }

        async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
            Ok(StatePatch {
                chapter_number: Some(state.chapter_number + 1),
                ..Default::default()
            })
        }
    }

    struct FailingStep;

    #[async_trait]
    impl StepNode for FailingStep {
        fn name(&self) -> NodeName {
            "failing"
        }

        async fn run(&self, _state: &WorkflowState) -> Result<StatePatch> {
            anyhow::bail!("boom")
        }
    }

    fn stop_after_max(state: &WorkflowState) -> LoopDecision {
        if state.chapter_number >= state.max_chapter_no {
            LoopDecision::Terminate
        } else {
            LoopDecision::Continue
        }
    }

    fn initial() -> WorkflowState {
        WorkflowState::new(&BookRequest::new("Book", "8"))
    }

    #[tokio::test]
    async fn test_linear_execution_order() {
        let graph = WorkflowGraph::new()
            .add_node(Box::new(RecordStep { name: "a" }))
            .add_node(Box::new(RecordStep { name: "b" }))
            .set_entry("a")
            .add_edge("a", "b")
            .compile()
            .unwrap();

        let state = graph.run(initial()).await.unwrap();
        let order: Vec<&str> = state.qna.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_loop_edge_iterates_until_terminate() {
        let mut init = initial();
        init.max_chapter_no = 3;

        let graph = WorkflowGraph::new()
            .add_node(Box::new(RecordStep { name: "body" }))
            .add_node(Box::new(IncrementStep))
            .set_entry("body")
            .add_conditional_edge("body", stop_after_max, "increment")
            .add_loop_edge("increment", "body")
            .compile()
            .unwrap();

        let state = graph.run(init).await.unwrap();
        // body 在第 1、2、3 章各执行一次
        let seen: Vec<&str> = state.qna.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(seen, vec!["1", "2", "3"]);
        assert_eq!(state.chapter_number, 3);
    }

    #[tokio::test]
    async fn test_failing_step_aborts_without_merging() {
        let graph = WorkflowGraph::new()
            .add_node(Box::new(RecordStep { name: "a" }))
            .add_node(Box::new(FailingStep))
            .add_node(Box::new(RecordStep { name: "never" }))
            .set_entry("a")
            .add_edge("a", "failing")
            .add_edge("failing", "never")
            .compile()
            .unwrap();

        let err = graph.run(initial()).await.unwrap_err();
        assert!(err.to_string().contains("failing"));
    }

    #[test]
    fn test_compile_rejects_missing_entry() {
        let result = WorkflowGraph::new()
            .add_node(Box::new(RecordStep { name: "a" }))
            .compile();
        assert!(matches!(
            result.err(),
            Some(AppError::Graph(GraphError::MissingEntry))
        ));
    }

    #[test]
    fn test_compile_rejects_unknown_edge_target() {
        let result = WorkflowGraph::new()
            .add_node(Box::new(RecordStep { name: "a" }))
            .set_entry("a")
            .add_edge("a", "ghost")
            .compile();
        assert!(matches!(
            result.err(),
            Some(AppError::Graph(GraphError::UnknownNode { .. }))
        ));
    }

    #[test]
    fn test_compile_rejects_second_loop_edge() {
        let result = WorkflowGraph::new()
            .add_node(Box::new(RecordStep { name: "a" }))
            .add_node(Box::new(RecordStep { name: "b" }))
            .set_entry("a")
            .add_loop_edge("a", "b")
            .add_loop_edge("b", "a")
            .compile();
        assert!(matches!(
            result.err(),
            Some(AppError::Graph(GraphError::DuplicateLoopEdge { .. }))
        ));
    }

    #[test]
    fn test_compile_rejects_cycle_outside_loop_edge() {
        // 用普通边而不是回边构成的环必须被拒绝
        let result = WorkflowGraph::new()
            .add_node(Box::new(RecordStep { name: "a" }))
            .add_node(Box::new(RecordStep { name: "b" }))
            .set_entry("a")
            .add_edge("a", "b")
            .add_edge("b", "a")
            .compile();
        assert!(matches!(
            result.err(),
            Some(AppError::Graph(GraphError::CycleDetected { .. }))
        ));
    }

    #[test]
    fn test_compile_rejects_two_outgoing_edges() {
        let result = WorkflowGraph::new()
            .add_node(Box::new(RecordStep { name: "a" }))
            .add_node(Box::new(RecordStep { name: "b" }))
            .add_node(Box::new(RecordStep { name: "c" }))
            .set_entry("a")
            .add_edge("a", "b")
            .add_edge("a", "c")
            .compile();
        assert!(matches!(
            result.err(),
            Some(AppError::Graph(GraphError::DuplicateEdge { .. }))
        ));
    }
}
