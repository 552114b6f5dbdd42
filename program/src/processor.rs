use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use crate::error::RaffleError;
use crate::instruction::{InitializeArgs, RaffleInstruction};
use crate::raffle::{PrizeVault, Raffle};
use crate::randomness::{LogOracle, RandomValue, RequestId};
use crate::state::RaffleConfig;
use crate::utils::{
    find_config_address, find_raffle_address, lamports_to_sol, CONFIG_SEED, RAFFLE_SEED,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::Initialize(args) => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, args, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_value,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, random_value, program_id)
            }
        }
    }

    fn process_initialize(
        accounts: &[AccountInfo],
        args: InitializeArgs,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !admin_info.is_signer {
            msg!("Admin must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if !system_program::check_id(system_program_info.key) {
            return Err(ProgramError::IncorrectProgramId);
        }

        let (expected_config, config_bump) = find_config_address(program_id);
        let (expected_raffle, raffle_bump) = find_raffle_address(program_id);
        if *config_info.key != expected_config || *raffle_info.key != expected_raffle {
            msg!("Invalid config or raffle account address");
            return Err(ProgramError::InvalidArgument);
        }
        if config_info.owner == program_id || raffle_info.owner == program_id {
            return Err(fail(RaffleError::AlreadyInitialized));
        }

        let config = RaffleConfig::new(*admin_info.key, *oracle_info.key, &args, raffle_bump)
            .map_err(fail)?;

        let rent = Rent::get()?;
        if config.entrance_fee < rent.minimum_balance(0) {
            msg!(
                "Entrance fee must be at least {} lamports so every prize is rent exempt",
                rent.minimum_balance(0)
            );
            return Err(fail(RaffleError::InvalidConfig));
        }

        create_pda_account(
            admin_info,
            &rent,
            RaffleConfig::LEN,
            program_id,
            system_program_info,
            config_info,
            &[CONFIG_SEED, &[config_bump]],
        )?;
        create_pda_account(
            admin_info,
            &rent,
            Raffle::space(config.max_players as usize),
            program_id,
            system_program_info,
            raffle_info,
            &[RAFFLE_SEED, &[raffle_bump]],
        )?;

        let now = Clock::get()?.unix_timestamp;
        RaffleConfig::pack(config, &mut config_info.data.borrow_mut())?;
        Raffle::new(now).store(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntranceFee={} SOL, Interval={}s, MaxPlayers={}, Oracle={}",
            lamports_to_sol(config.entrance_fee),
            config.interval,
            config.max_players,
            config.oracle
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if !system_program::check_id(system_program_info.key) {
            return Err(ProgramError::IncorrectProgramId);
        }

        let config = load_config(config_info, program_id)?;
        check_raffle_account(raffle_info, &config, program_id)?;

        let mut raffle = Raffle::load(&raffle_info.data.borrow())?;
        raffle.sync_held_funds(held_funds(raffle_info)?);
        let event = raffle
            .enter(&config, *player_info.key, amount)
            .map_err(fail)?;

        if player_info.lamports() < amount {
            msg!(
                "Insufficient funds: needed {} lamports, had {} lamports",
                amount,
                player_info.lamports()
            );
            return Err(ProgramError::InsufficientFunds);
        }
        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        raffle.store(&mut raffle_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        let config = load_config(config_info, program_id)?;
        check_raffle_account(raffle_info, &config, program_id)?;
        let mut raffle = Raffle::load(&raffle_info.data.borrow())?;
        raffle.sync_held_funds(held_funds(raffle_info)?);

        let now = Clock::get()?.unix_timestamp;
        let upkeep_needed = raffle.check_upkeep(&config, now);
        let snapshot = raffle.upkeep_snapshot(now);
        msg!(
            "Upkeep needed: {} (state {:?}, elapsed {}s of {}s, players {}, balance {})",
            upkeep_needed,
            snapshot.state,
            snapshot.now.saturating_sub(snapshot.last_timestamp),
            config.interval,
            snapshot.player_count,
            snapshot.pool_balance
        );
        set_return_data(&[upkeep_needed as u8, u8::from(snapshot.state)]);
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let keeper_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        // Any signer may act as the keeper
        if !keeper_info.is_signer {
            msg!("Keeper must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let config = load_config(config_info, program_id)?;
        check_raffle_account(raffle_info, &config, program_id)?;

        let now = Clock::get()?.unix_timestamp;
        let mut raffle = Raffle::load(&raffle_info.data.borrow())?;
        raffle.sync_held_funds(held_funds(raffle_info)?);
        let event = raffle
            .perform_upkeep(&config, now, &mut LogOracle::new(raffle_info.key))
            .map_err(fail)?;

        raffle.store(&mut raffle_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: RequestId,
        random_value: RandomValue,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let config = load_config(config_info, program_id)?;
        if !oracle_info.is_signer || *oracle_info.key != config.oracle {
            return Err(fail(RaffleError::UnauthorizedOracle));
        }
        check_raffle_account(raffle_info, &config, program_id)?;

        let now = Clock::get()?.unix_timestamp;
        let reserve = Rent::get()?.minimum_balance(raffle_info.data_len());
        let mut raffle = Raffle::load(&raffle_info.data.borrow())?;
        raffle.sync_held_funds(held_funds(raffle_info)?);
        let mut vault = LamportVault {
            pool: raffle_info,
            recipient: winner_info,
            reserve,
        };
        let event = raffle
            .fulfill_random_words(request_id, &random_value, now, &mut vault)
            .map_err(fail)?;

        raffle.store(&mut raffle_info.data.borrow_mut())?;
        event.emit();
        Ok(())
    }
}

/// Pays the prize from the raffle account's lamports, keeping it rent exempt
struct LamportVault<'a, 'b> {
    pool: &'b AccountInfo<'a>,
    recipient: &'b AccountInfo<'a>,
    reserve: u64,
}

impl PrizeVault for LamportVault<'_, '_> {
    fn pay_out(&mut self, winner: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        if self.recipient.key != winner {
            msg!(
                "Winner account {} does not match selected winner {}",
                self.recipient.key,
                winner
            );
            return Err(RaffleError::TransferFailed);
        }
        if !self.recipient.is_writable {
            msg!("Winner account must be writable");
            return Err(RaffleError::TransferFailed);
        }

        let remaining = self
            .pool
            .lamports()
            .checked_sub(amount)
            .filter(|remaining| *remaining >= self.reserve)
            .ok_or(RaffleError::TransferFailed)?;
        let credited = self
            .recipient
            .lamports()
            .checked_add(amount)
            .ok_or(RaffleError::AmountOverflow)?;

        **self
            .pool
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::TransferFailed)? = remaining;
        **self
            .recipient
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::TransferFailed)? = credited;

        msg!("Paid {} SOL to {}", lamports_to_sol(amount), winner);
        Ok(())
    }
}

/// Creates a program owned account at a PDA. An address that was already
/// sent lamports is topped up, allocated and assigned instead.
fn create_pda_account<'a>(
    payer_info: &AccountInfo<'a>,
    rent: &Rent,
    space: usize,
    owner: &Pubkey,
    system_program_info: &AccountInfo<'a>,
    new_account_info: &AccountInfo<'a>,
    signer_seeds: &[&[u8]],
) -> ProgramResult {
    let required_lamports = rent.minimum_balance(space);
    if new_account_info.lamports() == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                new_account_info.key,
                required_lamports,
                space as u64,
                owner,
            ),
            &[
                payer_info.clone(),
                new_account_info.clone(),
                system_program_info.clone(),
            ],
            &[signer_seeds],
        );
    }

    msg!(
        "Account {} already holds {} lamports",
        new_account_info.key,
        new_account_info.lamports()
    );
    let shortfall = required_lamports.saturating_sub(new_account_info.lamports());
    if shortfall > 0 {
        invoke(
            &system_instruction::transfer(payer_info.key, new_account_info.key, shortfall),
            &[
                payer_info.clone(),
                new_account_info.clone(),
                system_program_info.clone(),
            ],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(new_account_info.key, space as u64),
        &[new_account_info.clone(), system_program_info.clone()],
        &[signer_seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(new_account_info.key, owner),
        &[new_account_info.clone(), system_program_info.clone()],
        &[signer_seeds],
    )
}

/// Lamports on the raffle account above its rent exempt reserve
fn held_funds(raffle_info: &AccountInfo) -> Result<u64, ProgramError> {
    let reserve = Rent::get()?.minimum_balance(raffle_info.data_len());
    Ok(raffle_info.lamports().saturating_sub(reserve))
}

fn fail(err: RaffleError) -> ProgramError {
    msg!("Error: {}", err);
    err.into()
}

fn load_config(config_info: &AccountInfo, program_id: &Pubkey) -> Result<RaffleConfig, ProgramError> {
    if config_info.owner != program_id {
        msg!("Config account must be owned by this program");
        return Err(ProgramError::IncorrectProgramId);
    }
    if *config_info.key != find_config_address(program_id).0 {
        msg!("Invalid config account address");
        return Err(ProgramError::InvalidArgument);
    }
    RaffleConfig::unpack(&config_info.data.borrow()).map_err(|_| fail(RaffleError::NotInitialized))
}

fn check_raffle_account(
    raffle_info: &AccountInfo,
    config: &RaffleConfig,
    program_id: &Pubkey,
) -> ProgramResult {
    if raffle_info.owner != program_id {
        msg!("Raffle account must be owned by this program");
        return Err(ProgramError::IncorrectProgramId);
    }
    let expected = Pubkey::create_program_address(&[RAFFLE_SEED, &[config.raffle_bump]], program_id)
        .map_err(|_| ProgramError::InvalidSeeds)?;
    if *raffle_info.key != expected {
        msg!("Invalid raffle account address");
        return Err(ProgramError::InvalidArgument);
    }
    Ok(())
}
