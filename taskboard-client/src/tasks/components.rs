use chrono::{Local, NaiveDate};
use yew::events::{ChangeData, InputData};
use yew::prelude::*;

use super::model::{Task, TaskId, TaskRequest, TaskStatus, DATE_FORMAT};
use super::service::{ApiError, PendingRequest, TaskService};
use super::util::*;

fn view_task_card(task: &Task, today: NaiveDate, link: &ComponentLink<TaskListComponent>) -> Html {
    let task_id = task.id;
    let edit_callback = link.callback(move |_| TaskListMsg::OpenEdit(task_id));
    let delete_callback = link.callback(move |_| TaskListMsg::OpenDelete(task_id));
    let status_callback = link.batch_callback(move |event: ChangeData| match event {
        ChangeData::Select(element) => {
            TaskStatus::parse(&element.value()).map(|status| TaskListMsg::ChangeStatus(task_id, status))
        }
        _ => None,
    });

    let due_label = match parse_due_date(&task.due_date) {
        Ok(due) => {
            let overdue = due.date() < today;
            let classes = if overdue {
                classes!("task-card__due-label", "task-card__due-label--overdue")
            } else {
                classes!("task-card__due-label")
            };
            html! { <span class=classes>{ due_date_label(due, today) }</span> }
        }
        Err(_) => html! { <span class="task-card__due-label">{"Invalid date"}</span> },
    };

    html! {
        <div class="task-card">
            <div class="task-card__header">
                <h3 class="task-card__title">{ &task.title }</h3>
                <span class=classes!("task-card__status", task.status.badge_class())>
                    { task.status.label() }
                </span>
            </div>
            {
                match &task.description {
                    Some(description) if !description.is_empty() => html! {
                        <p class="task-card__description">{ description }</p>
                    },
                    _ => html! {},
                }
            }
            <div class="task-card__meta">
                { due_label }
                <span class="task-card__date">{ format!("Due: {}", format_display_date(&task.due_date)) }</span>
                <span class="task-card__date">{ format!("Created: {}", format_display_date(&task.created_at)) }</span>
            </div>
            <div class="task-card__actions">
                <select class="task-card__status-select" onchange=status_callback>
                    { TaskStatus::ALL.iter().map(|status| html! {
                        <option value=status.as_str() selected=task.status == *status>{ status.label() }</option>
                    }).collect::<Html>() }
                </select>
                <button class="btn btn--secondary" onclick=edit_callback aria-label="Edit task">{"Edit"}</button>
                <button class="btn btn--danger" onclick=delete_callback aria-label="Delete task">{"Delete"}</button>
            </div>
        </div>
    }
}

enum LoadState {
    Loading,
    Loaded,
    LoadFailed(String),
}

/// At most one modal is visible at a time.
enum ModalState {
    Closed,
    Create,
    Edit(TaskId),
    Delete(TaskId),
}

pub enum TaskListMsg {
    FetchTasks,
    TasksReceived(Result<Vec<Task>, ApiError>),
    SetFilter(StatusFilter),
    OpenCreate,
    OpenEdit(TaskId),
    OpenDelete(TaskId),
    CloseModal,
    SubmitCreate(TaskRequest),
    SubmitUpdate(TaskRequest),
    ChangeStatus(TaskId, TaskStatus),
    ConfirmDelete,
    TaskSaved(Result<Task, ApiError>),
    TaskDeleted(Result<(), ApiError>),
}

pub struct TaskListComponent {
    link: ComponentLink<Self>,
    tasks: Vec<Task>,
    load_state: LoadState,
    modal: ModalState,
    filter: StatusFilter,
    action_error: Option<String>,
    last_action: &'static str,
    _list_request: Option<PendingRequest>,
    _mutation_request: Option<PendingRequest>,
}

impl TaskListComponent {
    fn fetch_tasks(&mut self) {
        self.load_state = LoadState::Loading;

        let callback = self.link.callback(TaskListMsg::TasksReceived);
        match TaskService::list_tasks(callback) {
            Ok(request) => self._list_request = Some(request),
            Err(e) => {
                log_error_to_js(&e);
                self.load_state =
                    LoadState::LoadFailed("Failed to load tasks. Please try again later.".to_string());
            }
        }
    }

    fn start_mutation(
        &mut self,
        action: &'static str,
        request: anyhow::Result<PendingRequest>,
    ) {
        self.last_action = action;
        match request {
            Ok(request) => self._mutation_request = Some(request),
            Err(e) => {
                log_error_to_js(&e);
                self.action_error = Some(format!("Failed to {} task. Please try again.", action));
            }
        }
    }

    fn selected_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn view_filters(&self) -> Html {
        let filter_button = |filter: StatusFilter| {
            let class = if self.filter == filter { "active" } else { "" };
            html! {
                <button class=class onclick=self.link.callback(move |_| TaskListMsg::SetFilter(filter))>
                    { filter.label() }
                </button>
            }
        };

        html! {
            <div class="task-management__filters">
                { filter_button(StatusFilter::All) }
                { TaskStatus::ALL.iter().map(|status| filter_button(StatusFilter::Status(*status))).collect::<Html>() }
            </div>
        }
    }

    fn view_body(&self) -> Html {
        match &self.load_state {
            LoadState::Loading => html! {
                <div class="task-management__loading">{"Loading tasks..."}</div>
            },
            LoadState::LoadFailed(message) => html! {
                <div class="task-management__error">{ message }</div>
            },
            LoadState::Loaded => {
                let today = Local::now().naive_local().date();
                let visible = filter_tasks(&self.tasks, self.filter);

                if visible.is_empty() {
                    html! {
                        <div class="task-management__empty">
                            <h2>{"No tasks found"}</h2>
                            <p>{ self.filter.empty_message() }</p>
                        </div>
                    }
                } else {
                    html! {
                        <div class="task-management__list">
                            { visible.iter().map(|task| view_task_card(task, today, &self.link)).collect::<Html>() }
                        </div>
                    }
                }
            }
        }
    }

    fn view_modal(&self) -> Html {
        let on_close = self.link.callback(|_| TaskListMsg::CloseModal);

        match &self.modal {
            ModalState::Closed => html! {},
            ModalState::Create => html! {
                <TaskFormComponent
                    title="Create New Task".to_string()
                    error=self.action_error.clone()
                    on_submit=self.link.callback(TaskListMsg::SubmitCreate)
                    on_close=on_close
                />
            },
            ModalState::Edit(id) => match self.selected_task(*id) {
                Some(task) => html! {
                    <TaskFormComponent
                        title="Edit Task".to_string()
                        initial=Some(task.clone())
                        error=self.action_error.clone()
                        on_submit=self.link.callback(TaskListMsg::SubmitUpdate)
                        on_close=on_close
                    />
                },
                None => html! {},
            },
            ModalState::Delete(id) => match self.selected_task(*id) {
                Some(task) => html! {
                    <DeleteConfirmationComponent
                        task_title=task.title.clone()
                        on_confirm=self.link.callback(|_| TaskListMsg::ConfirmDelete)
                        on_close=on_close
                    />
                },
                None => html! {},
            },
        }
    }
}

impl Component for TaskListComponent {
    type Message = TaskListMsg;
    type Properties = ();

    fn create(_: Self::Properties, link: ComponentLink<Self>) -> Self {
        TaskListComponent {
            link,
            tasks: vec![],
            load_state: LoadState::Loading,
            modal: ModalState::Closed,
            filter: StatusFilter::All,
            action_error: None,
            last_action: "load",
            _list_request: None,
            _mutation_request: None,
        }
    }

    fn update(&mut self, msg: Self::Message) -> ShouldRender {
        match msg {
            TaskListMsg::FetchTasks => {
                self.fetch_tasks();
                true
            }
            TaskListMsg::TasksReceived(result) => {
                if self._list_request.is_none() {
                    // Superseded request, its governing state has been reset.
                    return false;
                }
                self._list_request = None;

                match result {
                    Ok(tasks) => {
                        self.tasks = tasks;
                        self.load_state = LoadState::Loaded;
                    }
                    Err(_) => {
                        self.load_state = LoadState::LoadFailed(
                            "Failed to load tasks. Please try again later.".to_string(),
                        );
                    }
                }
                true
            }
            TaskListMsg::SetFilter(filter) => {
                self.filter = filter;
                true
            }
            TaskListMsg::OpenCreate => {
                self.modal = ModalState::Create;
                self.action_error = None;
                true
            }
            TaskListMsg::OpenEdit(id) => {
                self.modal = ModalState::Edit(id);
                self.action_error = None;
                true
            }
            TaskListMsg::OpenDelete(id) => {
                self.modal = ModalState::Delete(id);
                self.action_error = None;
                true
            }
            TaskListMsg::CloseModal => {
                self.modal = ModalState::Closed;
                self.action_error = None;
                true
            }
            TaskListMsg::SubmitCreate(request) => {
                let callback = self.link.callback(TaskListMsg::TaskSaved);
                let pending = TaskService::create_task(&request, callback);
                self.start_mutation("create", pending);
                true
            }
            TaskListMsg::SubmitUpdate(request) => {
                if let ModalState::Edit(id) = self.modal {
                    let callback = self.link.callback(TaskListMsg::TaskSaved);
                    let pending = TaskService::update_task(id, &request, callback);
                    self.start_mutation("update", pending);
                }
                true
            }
            TaskListMsg::ChangeStatus(id, status) => {
                let callback = self.link.callback(TaskListMsg::TaskSaved);
                let pending = TaskService::update_task_status(id, status, callback);
                self.start_mutation("update", pending);
                false
            }
            TaskListMsg::ConfirmDelete => {
                if let ModalState::Delete(id) = self.modal {
                    let callback = self.link.callback(TaskListMsg::TaskDeleted);
                    let pending = TaskService::delete_task(id, callback);
                    self.start_mutation("delete", pending);
                }
                true
            }
            TaskListMsg::TaskSaved(result) => {
                if self._mutation_request.is_none() {
                    return false;
                }
                self._mutation_request = None;

                match result {
                    Ok(_) => {
                        // No local merge: the list is always re-fetched in
                        // full after a successful mutation.
                        self.modal = ModalState::Closed;
                        self.action_error = None;
                        self.link.send_message(TaskListMsg::FetchTasks);
                    }
                    Err(e) => {
                        self.action_error = Some(e.banner_message(self.last_action));
                    }
                }
                true
            }
            TaskListMsg::TaskDeleted(result) => {
                if self._mutation_request.is_none() {
                    return false;
                }
                self._mutation_request = None;

                self.modal = ModalState::Closed;
                match result {
                    Ok(()) => {
                        self.action_error = None;
                        self.link.send_message(TaskListMsg::FetchTasks);
                    }
                    Err(e) => {
                        self.action_error = Some(e.banner_message("delete"));
                    }
                }
                true
            }
        }
    }

    fn change(&mut self, _: Self::Properties) -> ShouldRender {
        false
    }

    fn view(&self) -> Html {
        html! {
            <div class="task-management">
                <div class="task-management__header">
                    <h1>{"Task Management"}</h1>
                    <button class="btn btn--primary btn--lg" onclick=self.link.callback(|_| TaskListMsg::OpenCreate)>
                        {"+ Add New Task"}
                    </button>
                </div>
                { self.view_filters() }
                {
                    match (&self.modal, &self.action_error) {
                        (ModalState::Closed, Some(message)) => html! {
                            <div class="task-management__error">{ message }</div>
                        },
                        _ => html! {},
                    }
                }
                { self.view_body() }
                { self.view_modal() }
            </div>
        }
    }

    fn rendered(&mut self, first_render: bool) {
        if first_render {
            self.link.send_message(TaskListMsg::FetchTasks);
        }
    }
}

#[derive(Properties, Clone)]
pub struct TaskFormProps {
    pub title: String,
    #[prop_or_default]
    pub initial: Option<Task>,
    #[prop_or_default]
    pub error: Option<String>,
    pub on_submit: Callback<TaskRequest>,
    pub on_close: Callback<()>,
}

pub enum TaskFormMsg {
    EditTitle(String),
    EditDescription(String),
    EditStatus(String),
    EditDueDate(String),
    Submit,
    Close,
}

pub struct TaskFormComponent {
    link: ComponentLink<Self>,
    props: TaskFormProps,
    title: String,
    description: String,
    status: TaskStatus,
    due_date: String,
    title_error: Option<String>,
    due_date_error: Option<String>,
}

impl TaskFormComponent {
    /// Validates locally before anything leaves the browser; a blocked
    /// submission performs no network call.
    fn submit(&mut self) {
        self.title_error = validate_title(&self.title).err();

        match parse_due_date(&self.due_date) {
            Ok(due) => {
                self.due_date_error = None;

                if self.title_error.is_none() {
                    self.props.on_submit.emit(TaskRequest {
                        title: self.title.trim().to_string(),
                        description: self.description.trim().to_string(),
                        status: self.status,
                        due_date: due.format(DATE_FORMAT).to_string(),
                    });
                }
            }
            Err(message) => {
                self.due_date_error = Some(message);
            }
        }
    }
}

impl Component for TaskFormComponent {
    type Message = TaskFormMsg;
    type Properties = TaskFormProps;

    fn create(props: Self::Properties, link: ComponentLink<Self>) -> Self {
        let (title, description, status, due_date) = match &props.initial {
            Some(task) => (
                task.title.clone(),
                task.description.clone().unwrap_or_default(),
                task.status,
                parse_due_date(&task.due_date)
                    .map(|due| due.format(DATE_FORMAT).to_string())
                    .unwrap_or_else(|_| task.due_date.clone()),
            ),
            None => (
                String::new(),
                String::new(),
                TaskStatus::Todo,
                Local::now().naive_local().format(DATE_FORMAT).to_string(),
            ),
        };

        TaskFormComponent {
            link,
            props,
            title,
            description,
            status,
            due_date,
            title_error: None,
            due_date_error: None,
        }
    }

    fn update(&mut self, msg: Self::Message) -> ShouldRender {
        match msg {
            TaskFormMsg::EditTitle(value) => {
                self.title = value;
                self.title_error = None;
                true
            }
            TaskFormMsg::EditDescription(value) => {
                self.description = value;
                false
            }
            TaskFormMsg::EditStatus(value) => {
                if let Some(status) = TaskStatus::parse(&value) {
                    self.status = status;
                }
                true
            }
            TaskFormMsg::EditDueDate(value) => {
                self.due_date = value;
                self.due_date_error = None;
                true
            }
            TaskFormMsg::Submit => {
                self.submit();
                true
            }
            TaskFormMsg::Close => {
                self.props.on_close.emit(());
                false
            }
        }
    }

    fn change(&mut self, props: Self::Properties) -> ShouldRender {
        self.props = props;
        true
    }

    fn view(&self) -> Html {
        let submit_label = if self.props.initial.is_some() {
            "Update Task"
        } else {
            "Create Task"
        };

        html! {
            <div class="modal">
                <div class="modal__content">
                    <div class="modal__header">
                        <h2>{ &self.props.title }</h2>
                        <button class="modal__close" aria-label="Close modal"
                            onclick=self.link.callback(|_| TaskFormMsg::Close)>
                            {"\u{00d7}"}
                        </button>
                    </div>
                    {
                        match &self.props.error {
                            Some(message) => html! {
                                <div class="task-form__error-banner">{ message }</div>
                            },
                            None => html! {},
                        }
                    }
                    <form class="task-form" onsubmit=self.link.callback(|e: FocusEvent| {
                        e.prevent_default();
                        TaskFormMsg::Submit
                    })>
                        <div class="task-form__group">
                            <label for="title" class="task-form__label">{"Title"}</label>
                            <input type="text" id="title" class="task-form__input" maxlength="100"
                                value=self.title.clone()
                                oninput=self.link.callback(|e: InputData| TaskFormMsg::EditTitle(e.value)) />
                            {
                                match &self.title_error {
                                    Some(message) => html! { <div class="task-form__error">{ message }</div> },
                                    None => html! {},
                                }
                            }
                        </div>
                        <div class="task-form__group">
                            <label for="description" class="task-form__label">{"Description (optional)"}</label>
                            <textarea id="description" class="task-form__textarea" maxlength="500"
                                value=self.description.clone()
                                oninput=self.link.callback(|e: InputData| TaskFormMsg::EditDescription(e.value)) />
                        </div>
                        <div class="task-form__group">
                            <label for="status" class="task-form__label">{"Status"}</label>
                            <select id="status" class="task-form__select"
                                onchange=self.link.batch_callback(|event: ChangeData| match event {
                                    ChangeData::Select(element) => Some(TaskFormMsg::EditStatus(element.value())),
                                    _ => None,
                                })>
                                { TaskStatus::ALL.iter().map(|status| html! {
                                    <option value=status.as_str() selected=self.status == *status>{ status.label() }</option>
                                }).collect::<Html>() }
                            </select>
                        </div>
                        <div class="task-form__group">
                            <label for="dueDate" class="task-form__label">{"Due Date"}</label>
                            <input type="datetime-local" id="dueDate" class="task-form__input"
                                value=self.due_date.clone()
                                oninput=self.link.callback(|e: InputData| TaskFormMsg::EditDueDate(e.value)) />
                            {
                                match &self.due_date_error {
                                    Some(message) => html! { <div class="task-form__error">{ message }</div> },
                                    None => html! {},
                                }
                            }
                        </div>
                        <div class="task-form__actions">
                            <button type="button" class="btn btn--secondary"
                                onclick=self.link.callback(|_| TaskFormMsg::Close)>
                                {"Cancel"}
                            </button>
                            <button type="submit" class="btn btn--primary btn--lg">{ submit_label }</button>
                        </div>
                    </form>
                </div>
            </div>
        }
    }
}

#[derive(Properties, Clone)]
pub struct DeleteConfirmationProps {
    pub task_title: String,
    pub on_confirm: Callback<()>,
    pub on_close: Callback<()>,
}

pub struct DeleteConfirmationComponent {
    link: ComponentLink<Self>,
    props: DeleteConfirmationProps,
}

pub enum DeleteConfirmationMsg {
    Confirm,
    Close,
}

impl Component for DeleteConfirmationComponent {
    type Message = DeleteConfirmationMsg;
    type Properties = DeleteConfirmationProps;

    fn create(props: Self::Properties, link: ComponentLink<Self>) -> Self {
        DeleteConfirmationComponent { link, props }
    }

    fn update(&mut self, msg: Self::Message) -> ShouldRender {
        match msg {
            DeleteConfirmationMsg::Confirm => self.props.on_confirm.emit(()),
            DeleteConfirmationMsg::Close => self.props.on_close.emit(()),
        }
        false
    }

    fn change(&mut self, props: Self::Properties) -> ShouldRender {
        self.props = props;
        true
    }

    fn view(&self) -> Html {
        html! {
            <div class="modal">
                <div class="modal__content">
                    <div class="modal__header">
                        <h2>{"Delete Task"}</h2>
                        <button class="modal__close" aria-label="Close modal"
                            onclick=self.link.callback(|_| DeleteConfirmationMsg::Close)>
                            {"\u{00d7}"}
                        </button>
                    </div>
                    <div class="delete-confirmation">
                        <p class="delete-confirmation__message">
                            {"Are you sure you want to delete the task: "}
                            <strong>{ &self.props.task_title }</strong>
                            {"? This action cannot be undone."}
                        </p>
                        <div class="delete-confirmation__actions">
                            <button type="button" class="btn btn--secondary"
                                onclick=self.link.callback(|_| DeleteConfirmationMsg::Close)>
                                {"Cancel"}
                            </button>
                            <button type="button" class="btn btn--danger"
                                onclick=self.link.callback(|_| DeleteConfirmationMsg::Confirm)>
                                {"Delete"}
                            </button>
                        </div>
                    </div>
                </div>
            </div>
        }
    }
}
