use pd_sim::SimProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingProject,
    CheckingCache,
    LoadingCachedResult,
    Integrating,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingProject => "loading project",
            RunStage::CheckingCache => "checking cache",
            RunStage::LoadingCachedResult => "loading cached run",
            RunStage::Integrating => "integrating",
            RunStage::SavingResults => "saving results",
            RunStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    /// Set while integrating.
    pub sim: Option<SimProgress>,
}
